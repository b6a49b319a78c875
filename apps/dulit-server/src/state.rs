//! Application state management

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, ConversionKind};
use crate::media::ImageHost;
use crate::pipeline::{
    ConversionStrategy, Delivery, JobPollingConverter, LocalConverter, PassGenerator, PollPolicy,
    RemoteScriptConverter, ScriptUploader, TemplateRenderer,
};

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("APPS_SCRIPT_URL must be set for the {0:?} conversion strategy")]
    MissingScriptUrl(ConversionKind),

    #[error("CLOUDCONVERT_API_KEY must be set for the job-polling conversion strategy")]
    MissingConversionKey,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: SqlitePool,
    generator: PassGenerator,
    image_host: ImageHost,
    shutdown: CancellationToken,
}

impl AppState {
    /// Create a new application state
    ///
    /// Wires the conversion strategy selected in `config`. Fails when the
    /// strategy's remote endpoint or credentials are missing.
    pub async fn new(
        config: Config,
        db: SqlitePool,
        shutdown: CancellationToken,
    ) -> Result<Self, StateError> {
        let client = reqwest::Client::new();
        let (converter, delivery) = build_strategy(&config, &client)?;

        if config.documents.conversion.strategy == ConversionKind::Local {
            let local = LocalConverter::new(
                config.documents.conversion.soffice_bin.clone(),
                config.documents.conversion.job_timeout,
            );
            if !local.is_available().await {
                tracing::warn!(
                    "{} not found; document generation will fail until it is installed",
                    config.documents.conversion.soffice_bin
                );
            }
        }

        if config.integrations.imgbb_key.is_none() {
            tracing::warn!("IMGBB_KEY not set; image uploads will be rejected");
        }

        let generator = PassGenerator::new(
            TemplateRenderer::new(config.documents.template_path.clone()),
            converter,
            delivery,
            config.documents.temp_dir.clone(),
            shutdown.clone(),
        );
        let image_host = ImageHost::new(
            client,
            config.integrations.imgbb_url.clone(),
            config.integrations.imgbb_key.clone(),
        );

        Ok(Self::from_parts(config, db, generator, image_host, shutdown))
    }

    /// Assemble state from already-built components
    pub fn from_parts(
        config: Config,
        db: SqlitePool,
        generator: PassGenerator,
        image_host: ImageHost,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                generator,
                image_host,
                shutdown,
            }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the database pool
    pub fn db(&self) -> &SqlitePool {
        &self.inner.db
    }

    /// Get the pass generator
    pub fn generator(&self) -> &PassGenerator {
        &self.inner.generator
    }

    pub fn image_host(&self) -> &ImageHost {
        &self.inner.image_host
    }

    /// Cancel in-flight pipeline runs
    pub fn shutdown(&self) {
        tracing::info!("Shutting down application state...");
        self.inner.shutdown.cancel();
    }
}

type Strategy = (Arc<dyn ConversionStrategy>, Option<Arc<dyn Delivery>>);

fn build_strategy(config: &Config, client: &reqwest::Client) -> Result<Strategy, StateError> {
    let conversion = &config.documents.conversion;
    let integrations = &config.integrations;

    let script_uploader = || -> Result<Arc<ScriptUploader>, StateError> {
        integrations
            .apps_script_url
            .as_ref()
            .map(|url| Arc::new(ScriptUploader::new(client.clone(), url.clone())))
            .ok_or(StateError::MissingScriptUrl(conversion.strategy))
    };

    match conversion.strategy {
        ConversionKind::Local => {
            let uploader: Arc<dyn Delivery> = script_uploader()?;
            let converter: Arc<dyn ConversionStrategy> = Arc::new(LocalConverter::new(
                conversion.soffice_bin.clone(),
                conversion.job_timeout,
            ));
            Ok((converter, Some(uploader)))
        }
        ConversionKind::RemoteScript => {
            let converter: Arc<dyn ConversionStrategy> =
                Arc::new(RemoteScriptConverter::new(script_uploader()?));
            Ok((converter, None))
        }
        ConversionKind::JobPolling => {
            let api_key = integrations
                .cloudconvert_key
                .clone()
                .ok_or(StateError::MissingConversionKey)?;
            let policy = PollPolicy {
                interval: conversion.poll_interval,
                timeout: conversion.job_timeout,
            };
            let converter: Arc<dyn ConversionStrategy> = Arc::new(JobPollingConverter::new(
                client.clone(),
                integrations.cloudconvert_url.clone(),
                api_key,
                policy,
            ));
            Ok((converter, None))
        }
    }
}
