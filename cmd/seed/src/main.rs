//! Bootstraps a fresh deployment: makes sure the general forum exists and
//! prints a platform-admin bearer token for the first API calls.
//!
//! Uses the same settings as the server; point `ALUMNI__DATABASE__URL` at
//! the database to seed.

use std::sync::Arc;

use auth_adapters::JwtAuthority;
use chrono::Duration;
use configs::{Settings, StorageBackend};
use domains::{Actor, DomainError, NewForum, Repos, Role};
use services::Services;
use storage_adapters::{LocalMediaStorage, SqliteStore};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&settings.log.filter))
        .init();

    if settings.database.backend != StorageBackend::Sqlite {
        anyhow::bail!("seeding needs a persistent store; set ALUMNI__DATABASE__BACKEND=sqlite");
    }
    let store = Arc::new(SqliteStore::connect(&settings.database.url).await?);
    let media = Arc::new(LocalMediaStorage::new(
        &settings.media.root,
        settings.media.max_upload_bytes,
    ));
    let services = Services::new(Repos::from_store(store), media);

    let admin = Actor::new(Uuid::now_v7(), Role::SuperAdmin, None);
    match services.forums.general().await {
        Ok(forum) => tracing::info!(forum = %forum.id, "general forum already present"),
        Err(DomainError::NotFound(_)) => {
            let forum = services
                .forums
                .create(
                    &admin,
                    NewForum {
                        name: "General Discussion".into(),
                        description: "Conversations open to every alumnus".into(),
                        school_id: None,
                        moderators: Some(vec![admin.id]),
                    },
                )
                .await?;
            tracing::info!(forum = %forum.id, "general forum created");
        }
        Err(err) => return Err(err.into()),
    }

    let ttl = Duration::hours(settings.auth.token_ttl_hours);
    let token = JwtAuthority::new(&settings.auth.jwt_secret)?.issue(&admin, ttl)?;
    println!("admin id:    {}", admin.id);
    println!("admin token: {token}");
    Ok(())
}
