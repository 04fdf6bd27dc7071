use std::env;
use std::path::PathBuf;
use unrelated_mcp_config::injection::{BuildMode, project, write_artifact};

const CONFIG_FILE: &str = "unrelated-mcp.config.yaml";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={CONFIG_FILE}");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    let config = unrelated_mcp_config::load_config(&manifest_dir.join(CONFIG_FILE))?;
    let resolved = config.resolve();
    resolved.ensure_transport()?;

    let mode = match env::var("PROFILE").as_deref() {
        Ok("release") => BuildMode::Production,
        _ => BuildMode::Development,
    };
    let vars = project(&resolved, mode)?;
    write_artifact(&out_dir, &vars)?;
    Ok(())
}
