use std::fs;

pub fn run(out_dir: std::path::PathBuf) -> color_eyre::Result<()> {
    let out_dir = if out_dir.as_os_str().is_empty() {
        std::path::PathBuf::from("./docs/schemas")
    } else {
        out_dir
    };
    fs::create_dir_all(&out_dir)?;
    macro_rules! dump {
        ($ty:ty, $name:literal) => {{
            let schema = schemars::schema_for!($ty);
            let path = out_dir.join($name);
            let f = std::fs::File::create(&path)?;
            serde_json::to_writer_pretty(f, &schema)?;
        }};
    }
    dump!(lingopack_domain::ImportReport, "import_report.schema.json");
    dump!(lingopack_domain::ImportSummary, "import_summary.schema.json");
    dump!(lingopack_domain::ExportFile, "export_file.schema.json");
    dump!(lingopack_domain::PackageUpload, "package_upload.schema.json");
    dump!(lingopack_domain::ErrorBody, "error_body.schema.json");
    println!("✔ schemas dumped to {}", out_dir.display());
    Ok(())
}
