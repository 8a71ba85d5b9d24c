//! Settings store - persistent pipeline configuration and status per connection.
//!
//! There is exactly one settings row per connection name. It is created by [`install`]
//! or [`init`], overwritten afterwards and never deleted. Status changes go through
//! [`set_status`], which enforces the install state machine.

use crate::{
    core::context::GeonamesContext,
    entities::{InstallStatus, Settings, SettingsColumn, settings},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Storage sub-directory used when none is configured.
pub const DEFAULT_STORAGE_SUBDIR: &str = "geonames";

const WRITE_PROBE_FILE: &str = ".geonames-write-probe";

/// Composes the download URL for a GeoNames file name.
#[must_use]
pub fn download_url_for_file(base_url: &str, file_name: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        file_name.trim_start_matches('/')
    )
}

/// Resolves the configured storage path against the storage root.
#[must_use]
pub fn absolute_storage_path(ctx: &GeonamesContext, settings: &settings::Model) -> PathBuf {
    ctx.storage_root.join(&settings.storage_path)
}

fn normalize_codes(codes: &[String], kind: &str, upper: bool) -> Result<String> {
    let mut normalized = BTreeSet::new();
    for code in codes {
        let code = code.trim();
        if code.is_empty() || code == "*" {
            continue;
        }
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::config(format!(
                "Invalid {kind} code '{code}': expected two letters"
            )));
        }
        normalized.insert(if upper {
            code.to_ascii_uppercase()
        } else {
            code.to_ascii_lowercase()
        });
    }
    Ok(normalized.into_iter().collect::<Vec<_>>().join(","))
}

/// Normalizes country codes to the stored form ("AD,FR"); `*` and blanks mean all.
pub fn normalize_country_codes(codes: &[String]) -> Result<String> {
    normalize_codes(codes, "country", true)
}

/// Normalizes language codes to the stored form ("de,en"); `*` and blanks mean all.
pub fn normalize_language_codes(codes: &[String]) -> Result<String> {
    normalize_codes(codes, "language", false)
}

/// Makes sure `path` exists and is writable by creating and removing a probe file.
fn ensure_writable_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| {
        Error::config(format!(
            "Unable to create storage directory {}: {e}",
            path.display()
        ))
    })?;
    let probe = path.join(WRITE_PROBE_FILE);
    std::fs::write(&probe, b"").map_err(|e| {
        Error::config(format!(
            "Storage directory {} is not writable: {e}",
            path.display()
        ))
    })?;
    std::fs::remove_file(&probe)?;
    Ok(())
}

/// Finds the settings row for the context's connection.
pub async fn find(ctx: &GeonamesContext) -> Result<Option<settings::Model>> {
    Settings::find()
        .filter(SettingsColumn::ConnectionName.eq(ctx.connection_name.as_str()))
        .one(&ctx.db)
        .await
        .map_err(Into::into)
}

/// Returns the settings row for the context's connection.
///
/// # Errors
/// Returns `Error::SettingsNotFound` if neither `install` nor `init` has run.
pub async fn get(ctx: &GeonamesContext) -> Result<settings::Model> {
    find(ctx).await?.ok_or_else(|| Error::SettingsNotFound {
        connection: ctx.connection_name.clone(),
    })
}

/// Creates or updates the settings for a connection.
///
/// Country and language filters plus the storage path are overwritten; status and
/// install time are preserved on an existing row. A new row starts `UNINSTALLED`.
///
/// # Errors
/// Returns `Error::Config` for malformed codes or when the storage directory cannot be
/// created or written.
#[instrument(skip(ctx), fields(connection = %ctx.connection_name))]
pub async fn install(
    ctx: &GeonamesContext,
    countries: &[String],
    languages: &[String],
    storage_path: &str,
) -> Result<settings::Model> {
    let countries = normalize_country_codes(countries)?;
    let languages = normalize_language_codes(languages)?;
    let storage_path = if storage_path.trim().is_empty() {
        DEFAULT_STORAGE_SUBDIR
    } else {
        storage_path.trim()
    };
    ensure_writable_dir(&ctx.storage_root.join(storage_path))?;

    let now = Utc::now();
    let saved = if let Some(existing) = find(ctx).await? {
        let mut active_model: settings::ActiveModel = existing.into();
        active_model.countries = Set(countries);
        active_model.languages = Set(languages);
        active_model.storage_path = Set(storage_path.to_owned());
        active_model.updated_at = Set(now);
        active_model.update(&ctx.db).await?
    } else {
        settings::ActiveModel {
            connection_name: Set(ctx.connection_name.clone()),
            status: Set(InstallStatus::Uninstalled),
            installed_at: Set(None),
            countries: Set(countries),
            languages: Set(languages),
            storage_path: Set(storage_path.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&ctx.db)
        .await?
    };

    info!(
        "Saved geonames settings: countries=[{}] languages=[{}] storage={}",
        saved.countries, saved.languages, saved.storage_path
    );
    Ok(saved)
}

/// Creates default settings if the connection has none yet.
pub async fn init(ctx: &GeonamesContext) -> Result<settings::Model> {
    match find(ctx).await? {
        Some(existing) => {
            ensure_writable_dir(&absolute_storage_path(ctx, &existing))?;
            Ok(existing)
        }
        None => install(ctx, &[], &[], DEFAULT_STORAGE_SUBDIR).await,
    }
}

async fn write_status(
    ctx: &GeonamesContext,
    current: settings::Model,
    status: InstallStatus,
) -> Result<settings::Model> {
    let mut active_model: settings::ActiveModel = current.into();
    active_model.status = Set(status);
    active_model.updated_at = Set(Utc::now());
    let saved = active_model.update(&ctx.db).await?;
    info!("Geonames status for '{}' is now {}", ctx.connection_name, status);
    Ok(saved)
}

/// Checks that the connection may move to `status` without writing anything.
///
/// A connection without settings counts as `UNINSTALLED`.
///
/// # Errors
/// Returns `Error::InvalidTransition` when the move is not allowed.
pub async fn ensure_transition(ctx: &GeonamesContext, status: InstallStatus) -> Result<()> {
    let from = find(ctx)
        .await?
        .map_or(InstallStatus::Uninstalled, |current| current.status);
    if from.can_transition_to(status) {
        Ok(())
    } else {
        Err(Error::InvalidTransition { from, to: status })
    }
}

/// Moves the status along the install state machine.
///
/// # Errors
/// Returns `Error::InvalidTransition` when the move is not allowed (for example
/// `LIVE` to `LIVE`, or `UNINSTALLED` straight to `LIVE`).
pub async fn set_status(ctx: &GeonamesContext, status: InstallStatus) -> Result<settings::Model> {
    let current = get(ctx).await?;
    if !current.status.can_transition_to(status) {
        return Err(Error::InvalidTransition {
            from: current.status,
            to: status,
        });
    }
    write_status(ctx, current, status).await
}

/// Overwrites the status without checking the state machine.
///
/// Only for operator recovery, e.g. a run that died while `INSTALLING`.
pub async fn force_status(
    ctx: &GeonamesContext,
    status: InstallStatus,
) -> Result<settings::Model> {
    let current = get(ctx).await?;
    warn!(
        "Forcing geonames status for '{}' from {} to {}",
        ctx.connection_name, current.status, status
    );
    write_status(ctx, current, status).await
}

/// Stamps the install time with the current time.
pub async fn set_installed_at(ctx: &GeonamesContext) -> Result<settings::Model> {
    let current = get(ctx).await?;
    let now = Utc::now();
    let mut active_model: settings::ActiveModel = current.into();
    active_model.installed_at = Set(Some(now));
    active_model.updated_at = Set(now);
    active_model.update(&ctx.db).await.map_err(Into::into)
}

/// Deletes everything inside `path`, keeping the directory itself.
///
/// Returns `false` if anything could not be removed. A missing directory counts as empty.
pub fn empty_directory(path: &Path) -> bool {
    let entries = match std::fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return true,
        Err(e) => {
            warn!("Unable to read storage directory {}: {}", path.display(), e);
            return false;
        }
    };

    let mut emptied = true;
    for entry in entries {
        let removed = entry.and_then(|entry| {
            let entry_path = entry.path();
            if entry.file_type()?.is_dir() {
                std::fs::remove_dir_all(&entry_path)
            } else {
                std::fs::remove_file(&entry_path)
            }
        });
        if let Err(e) = removed {
            warn!("Unable to remove entry in {}: {}", path.display(), e);
            emptied = false;
        }
    }
    debug!("Emptied storage directory {}: {}", path.display(), emptied);
    emptied
}

/// Empties the connection's storage directory. Never fails; check the returned flag.
pub async fn empty_storage_directory(ctx: &GeonamesContext) -> bool {
    match get(ctx).await {
        Ok(settings) => empty_directory(&absolute_storage_path(ctx, &settings)),
        Err(e) => {
            warn!("Unable to resolve storage directory: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_context;

    #[test]
    fn test_download_url_for_file() {
        assert_eq!(
            download_url_for_file("https://download.geonames.org/export/dump/", "countryInfo.txt"),
            "https://download.geonames.org/export/dump/countryInfo.txt"
        );
        assert_eq!(
            download_url_for_file("http://mirror.local/dump", "/alternatenames/AD.zip"),
            "http://mirror.local/dump/alternatenames/AD.zip"
        );
    }

    #[test]
    fn test_normalize_codes() {
        let codes = vec!["fr".to_string(), " AD ".to_string(), "FR".to_string()];
        assert_eq!(normalize_country_codes(&codes).unwrap(), "AD,FR");
        assert_eq!(normalize_country_codes(&["*".to_string()]).unwrap(), "");
        assert_eq!(
            normalize_language_codes(&["EN".to_string(), "de".to_string()]).unwrap(),
            "de,en"
        );
        assert!(matches!(
            normalize_country_codes(&["FRA".to_string()]),
            Err(Error::Config { .. })
        ));
    }

    #[tokio::test]
    async fn test_install_creates_row_and_storage() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;

        let saved = install(&ctx, &["ad".to_string()], &["en".to_string()], "geo").await?;
        assert_eq!(saved.status, InstallStatus::Uninstalled);
        assert_eq!(saved.country_codes(), vec!["AD".to_string()]);
        assert_eq!(saved.language_codes(), vec!["en".to_string()]);
        assert!(saved.installed_at.is_none());
        assert!(ctx.storage_root.join("geo").is_dir());
        Ok(())
    }

    #[tokio::test]
    async fn test_install_is_an_upsert() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;

        install(&ctx, &["AD".to_string()], &[], "geo").await?;
        set_status(&ctx, InstallStatus::Installing).await?;
        let updated = install(&ctx, &["FR".to_string()], &[], "geo").await?;

        assert_eq!(updated.countries, "FR");
        assert_eq!(updated.status, InstallStatus::Installing);
        assert_eq!(Settings::find().all(&ctx.db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_install_rejects_unwritable_storage() -> Result<()> {
        let (ctx, storage) = setup_test_context().await?;
        let blocker = storage.path().join("not-a-dir");
        std::fs::write(&blocker, b"file")?;

        let result = install(&ctx, &[], &[], "not-a-dir/geonames").await;
        assert!(matches!(result, Err(Error::Config { .. })));
        assert!(find(&ctx).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_init_does_not_overwrite() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;

        install(&ctx, &["AD".to_string()], &[], "custom").await?;
        let settings = init(&ctx).await?;
        assert_eq!(settings.countries, "AD");
        assert_eq!(settings.storage_path, "custom");
        Ok(())
    }

    #[tokio::test]
    async fn test_set_status_enforces_state_machine() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        init(&ctx).await?;

        let result = set_status(&ctx, InstallStatus::Live).await;
        assert!(matches!(
            result,
            Err(Error::InvalidTransition {
                from: InstallStatus::Uninstalled,
                to: InstallStatus::Live
            })
        ));

        set_status(&ctx, InstallStatus::Installing).await?;
        let live = set_status(&ctx, InstallStatus::Live).await?;
        assert_eq!(live.status, InstallStatus::Live);
        assert!(set_status(&ctx, InstallStatus::Live).await.is_err());

        let forced = force_status(&ctx, InstallStatus::Uninstalled).await?;
        assert_eq!(forced.status, InstallStatus::Uninstalled);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_status_without_settings() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        let result = set_status(&ctx, InstallStatus::Installing).await;
        assert!(matches!(result, Err(Error::SettingsNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_installed_at() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        init(&ctx).await?;
        let before = Utc::now();

        let stamped = set_installed_at(&ctx).await?;
        assert!(stamped.installed_at.unwrap() >= before);
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_storage_directory() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        let settings = init(&ctx).await?;
        let dir = absolute_storage_path(&ctx, &settings);
        std::fs::write(dir.join("countryInfo.txt"), b"AD")?;
        std::fs::create_dir_all(dir.join("geonames"))?;
        std::fs::write(dir.join("geonames").join("AD.txt"), b"1")?;

        assert!(empty_storage_directory(&ctx).await);
        assert!(dir.is_dir());
        assert_eq!(std::fs::read_dir(&dir)?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_empty_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(empty_directory(&dir.path().join("never-created")));
    }
}
