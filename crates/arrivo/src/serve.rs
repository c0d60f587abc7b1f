// SPDX-FileCopyrightText: 2026 Arrivo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Component wiring for `arrivo serve`.
//!
//! Opens storage, builds the escalation pipeline with its collaborators,
//! spawns the background tasks (evaluation worker, outbox sweep, timer fire
//! loop), and runs the webhook ingress until ctrl-c.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use arrivo_config::ArrivoConfig;
use arrivo_core::ArrivoError;
use arrivo_core::traits::{ManagerNotifier, MessagingGateway, WorkflowScheduler};
use arrivo_core::types::SchedulePayload;
use arrivo_engine::scheduler::SchedulerSettings;
use arrivo_engine::{
    ActionDispatcher, EscalationScheduler, EvaluationWorker, OutboxSweep, StatusIngestor,
    TimerScheduler,
};
use arrivo_gateway::{GatewayNotifier, HttpMessagingGateway, WebhookState};
use arrivo_storage::Database;

pub async fn run(config: ArrivoConfig) -> Result<(), ArrivoError> {
    let db = Database::open(&config.storage.database_path).await?;
    info!(path = %config.storage.database_path, "storage opened");

    // External collaborators behind their trait seams.
    let gateway: Arc<dyn MessagingGateway> =
        Arc::new(HttpMessagingGateway::from_config(&config.gateway)?);
    let notifier: Arc<dyn ManagerNotifier> = Arc::new(GatewayNotifier::new(
        gateway.clone(),
        config.notify.manager_phone.clone(),
    ));
    let (fire_tx, mut fire_rx) = mpsc::channel::<SchedulePayload>(64);
    let workflow: Arc<dyn WorkflowScheduler> = Arc::new(TimerScheduler::new(fire_tx));

    // The pipeline.
    let settings = SchedulerSettings::from(&config.escalation);
    let dispatcher = ActionDispatcher::new(
        db.clone(),
        gateway.clone(),
        notifier,
        settings.session_window,
    );
    let scheduler = Arc::new(EscalationScheduler::new(
        db.clone(),
        workflow,
        dispatcher,
        settings,
    ));

    let cancel = CancellationToken::new();

    let worker = EvaluationWorker::new(
        db.clone(),
        scheduler.clone(),
        std::time::Duration::from_secs(config.worker.poll_interval_secs),
        cancel.clone(),
    );
    tokio::spawn(async move { worker.run().await });

    let sweep = OutboxSweep::new(
        db.clone(),
        scheduler.clone(),
        std::time::Duration::from_secs(config.worker.sweep_interval_secs),
        chrono::Duration::minutes(config.worker.sweep_grace_mins),
        cancel.clone(),
    );
    tokio::spawn(async move { sweep.run().await });

    // Timer fire loop: in-process timers deliver here; the scheduler
    // re-checks everything at fire time.
    let fire_scheduler = scheduler.clone();
    let fire_cancel = cancel.clone();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = fire_cancel.cancelled() => return,
                payload = fire_rx.recv() => {
                    let Some(payload) = payload else { return };
                    if let Err(e) = fire_scheduler.on_fire(&payload.check_id).await {
                        error!(check_id = %payload.check_id, error = %e, "fired check failed");
                    }
                }
            }
        }
    });

    // Webhook ingress in the foreground.
    let state = WebhookState {
        ingestor: Arc::new(StatusIngestor::new(db.clone())),
        webhook_secret: config.server.webhook_secret.clone(),
        start_time: std::time::Instant::now(),
    };
    let server_config = arrivo_gateway::ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    let ingress = tokio::spawn(async move {
        arrivo_gateway::start_server(&server_config, state).await
    });

    tokio::select! {
        result = ingress => {
            cancel.cancel();
            match result {
                Ok(server_result) => server_result,
                Err(e) => Err(ArrivoError::Internal(format!("ingress task panicked: {e}"))),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            cancel.cancel();
            db.close().await?;
            Ok(())
        }
    }
}
