//! Durable log sink.
//!
//! Pipeline failures and completed installs are written to `geonames_logs` in addition to
//! `tracing`. Writing the log must never mask the failure being logged, so these functions
//! swallow their own errors after reporting them through `tracing`.

use crate::{
    core::context::GeonamesContext,
    entities::log,
    errors::Error,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use tracing::{error, info, warn};

async fn write(ctx: &GeonamesContext, url: Option<&str>, message: &str, category: &str) {
    let entry = log::ActiveModel {
        url: Set(url.map(str::to_owned)),
        message: Set(message.to_owned()),
        category: Set(category.to_owned()),
        connection_name: Set(ctx.connection_name.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    if let Err(e) = entry.insert(&ctx.db).await {
        warn!("Unable to write geonames log entry: {}", e);
    }
}

/// Records a failure together with the URL or path it originated from.
pub async fn record_error(ctx: &GeonamesContext, origin: Option<&str>, err: &Error) {
    error!(
        origin = origin.unwrap_or("-"),
        category = err.category(),
        "{}",
        err
    );
    write(ctx, origin, &err.to_string(), err.category()).await;
}

/// Records an informational event.
pub async fn record_info(ctx: &GeonamesContext, message: &str, category: &str) {
    info!(category, "{}", message);
    write(ctx, None, message, category).await;
}
