use std::path::Path;

// Entry point for `cargo run -p web-server`: serve with the default config
// file and nothing else. The root binary offers the full CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = configuration::load_settings(Path::new(configuration::DEFAULT_CONFIG_FILE))?;
    let _guard = configuration::init_tracing(&settings.logging)?;
    web_server::run_server(&settings).await
}
