use std::sync::Arc;

use relay_core::{config::Config, session::RelayState};
use relay_telegram::{router, Bot};
use tokio_util::sync::CancellationToken;

mod health;
mod signals;

#[tokio::main]
async fn main() -> Result<(), relay_core::Error> {
    relay_core::logging::init("relay")?;

    let cfg = Arc::new(Config::load()?);
    let state = Arc::new(RelayState::new());

    let bot = Bot::new(cfg.bot_token.clone());
    let engine = router::build_engine(bot.clone(), cfg.clone(), state.clone());

    let shutdown = CancellationToken::new();
    let signal_task = signals::listen(shutdown.clone())?;
    let health_task = tokio::spawn(health::serve(cfg.port, state, shutdown.clone()));

    let polled = router::run_polling(bot, cfg, engine.clone(), shutdown.clone()).await;

    // Stop accepting work, then drain broadcasts.
    shutdown.cancel();
    let _ = signal_task.await;
    engine.shutdown().await;
    match health_task.await {
        Ok(Err(e)) => tracing::error!(error = %e, "health endpoint failed"),
        Err(e) => tracing::error!(error = %e, "health endpoint task panicked"),
        Ok(Ok(())) => {}
    }

    polled.map_err(|e| relay_core::Error::Transport(format!("telegram bot failed: {e}")))?;
    Ok(())
}
