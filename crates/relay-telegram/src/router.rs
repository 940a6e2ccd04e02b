use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio_util::sync::CancellationToken;

use relay_core::{
    config::Config,
    engine::RelayEngine,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    session::RelayState,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub engine: RelayEngine,
}

/// Build the engine on top of a throttled Telegram messenger.
pub fn build_engine(bot: Bot, cfg: Arc<Config>, state: Arc<RelayState>) -> RelayEngine {
    // Throttle outbound calls to stay under Telegram's flood limits. 429
    // RetryAfter is still retried once in the adapter.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::from(cfg.as_ref()),
    ));
    RelayEngine::new(cfg, state, messenger)
}

/// Long-poll Telegram until `shutdown` fires. In-flight updates finish first;
/// the caller owns engine shutdown.
pub async fn run_polling(
    bot: Bot,
    cfg: Arc<Config>,
    engine: RelayEngine,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    match bot.get_me().await {
        Ok(me) => tracing::info!(bot = %me.username(), owner_id = cfg.owner_id.0, "relay bot started"),
        Err(e) => tracing::warn!(error = %e, "getMe failed; continuing"),
    }

    let state = Arc::new(AppState { engine });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            tracing::debug!(update_id = ?upd.id, "unhandled update");
        })
        .build();

    let token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        match token.shutdown() {
            Ok(stopped) => stopped.await,
            Err(e) => tracing::warn!(error = %e, "dispatcher was not running"),
        }
    });

    dispatcher.dispatch().await;

    tracing::info!("dispatcher stopped");
    Ok(())
}
