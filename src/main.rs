use anyhow::Context;
use lighting_demo::{demo, AppConfig, LightingApp};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()),
    )
    .init();
    log::info!("Starting {}", config.window.title);

    let scene = demo::build(&config).context("failed to build the demo scene")?;
    let app = LightingApp::new(config, scene).context("failed to create the event loop")?;
    app.run().context("application exited with an error")?;
    Ok(())
}
