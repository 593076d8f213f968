//! Run with: cargo run --package server --bin generate-types --features typescript

use std::fs;
use std::path::Path;

fn main() {
    println!("Generating TypeScript types...");

    let out_dir = Path::new("frontend/src/types/generated");

    if let Err(e) = fs::create_dir_all(out_dir) {
        eprintln!("Failed to create output directory: {}", e);
        std::process::exit(1);
    }

    #[cfg(feature = "typescript")]
    {
        use ts_rs::TS;

        bac_core::Stage::export_all_to(out_dir).expect("Failed to export Stage");
        bac_core::StageRecord::export_all_to(out_dir).expect("Failed to export StageRecord");
        bac_core::StageAction::export_all_to(out_dir).expect("Failed to export StageAction");
        bac_core::FieldEditability::export_all_to(out_dir)
            .expect("Failed to export FieldEditability");
        bac_core::SubmitStageRequest::export_all_to(out_dir)
            .expect("Failed to export SubmitStageRequest");
        bac_core::ProjectHeader::export_all_to(out_dir).expect("Failed to export ProjectHeader");
        bac_core::ProjectStatus::export_all_to(out_dir).expect("Failed to export ProjectStatus");
        bac_core::ProjectSummary::export_all_to(out_dir)
            .expect("Failed to export ProjectSummary");
        bac_core::ProjectStatistics::export_all_to(out_dir)
            .expect("Failed to export ProjectStatistics");
        bac_core::CreateProjectRequest::export_all_to(out_dir)
            .expect("Failed to export CreateProjectRequest");
        bac_core::UpdateProjectRequest::export_all_to(out_dir)
            .expect("Failed to export UpdateProjectRequest");
        bac_core::AuditStamp::export_all_to(out_dir).expect("Failed to export AuditStamp");
        bac_core::User::export_all_to(out_dir).expect("Failed to export User");

        server::routes::MeResponse::export_all_to(out_dir).expect("Failed to export MeResponse");
        server::routes::DashboardResponse::export_all_to(out_dir)
            .expect("Failed to export DashboardResponse");
        server::routes::ProjectDetail::export_all_to(out_dir)
            .expect("Failed to export ProjectDetail");
        server::routes::StageView::export_all_to(out_dir).expect("Failed to export StageView");
        server::routes::StageTransitionResponse::export_all_to(out_dir)
            .expect("Failed to export StageTransitionResponse");

        println!("TypeScript types generated in {}", out_dir.display());
        write_index(out_dir);
    }

    #[cfg(not(feature = "typescript"))]
    {
        eprintln!("Enable the 'typescript' feature to generate types");
        std::process::exit(1);
    }
}

#[cfg(feature = "typescript")]
fn write_index(out_dir: &Path) {
    use std::io::Write;

    let index_path = out_dir.join("index.ts");
    let mut file = fs::File::create(&index_path).expect("Failed to create index.ts");

    let modules = [
        "Stage",
        "StageRecord",
        "StageAction",
        "FieldEditability",
        "SubmitStageRequest",
        "ProjectHeader",
        "ProjectStatus",
        "ProjectSummary",
        "ProjectStatistics",
        "AuditStamp",
        "CreateProjectRequest",
        "UpdateProjectRequest",
        "User",
        "MeResponse",
        "DashboardResponse",
        "ProjectDetail",
        "StageView",
        "StageTransitionResponse",
    ];

    let mut exports = String::from("// Auto-generated by generate-types. Do not edit.\n\n");
    for module in modules {
        exports.push_str(&format!("export * from './{}';\n", module));
    }

    file.write_all(exports.as_bytes())
        .expect("Failed to write index.ts");

    println!("Generated {}", index_path.display());
}
