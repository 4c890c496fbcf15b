//! stowage demo: uploads a user avatar and a photo embedded in that user,
//! then lets the background workers process and store them.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Value, json};
use tracing::info;

use stowage_core::app::{
    AppBuilder, BackgroundAsset, BackgroundOptions, ProcessAssetHandler, RecordLocator,
    StoreAssetHandler, WorkerGroup,
};
use stowage_core::config::StowageConfig;
use stowage_core::domain::{FieldName, JobKind, RecordId, SaveMode, TypeName};
use stowage_core::impls::{Document, FsCacheStore, InMemoryDocumentStore, LocalUploader};
use stowage_core::observability;
use stowage_core::ports::{AssetAccessor, CachedFile, JobQueue, Record, RecordStore};
use stowage_core::queue::InMemoryJobQueue;
use stowage_core::typed::{ProcessAsset, StoreAsset};

#[derive(Debug, Parser)]
#[command(name = "stowage", about = "Run the deferred asset job demo")]
struct Args {
    /// JSON config file (defaults are used when omitted).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Upload root directory; overrides `uploads.root`.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Seconds to wait for the queue to drain.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => StowageConfig::from_path(path)?,
        None => StowageConfig::default(),
    };
    if let Some(root) = args.root {
        config.uploads.root = root;
    }
    if config.relations.resolve(&FieldName::new("user")).is_none() {
        config.relations = config.relations.with("user", "User");
    }
    config.queue.validate()?;
    info!(root = %config.uploads.root.display(), workers = config.worker_count(), "starting demo");

    // (A) ストア・アップローダ・キャッシュを用意
    let store = Arc::new(InMemoryDocumentStore::new());
    store
        .insert(
            "User",
            Document::new("22")
                .with_attribute("image", Value::Null)
                .with_attribute("image_processing", Value::Null)
                .with_many(
                    "photos",
                    vec![
                        Document::new("1")
                            .with_attribute("image", Value::Null)
                            .with_attribute("image_tmp", Value::Null),
                    ],
                ),
        )
        .await;
    let uploader = Arc::new(LocalUploader::new(config.uploads.clone()).mount("image"));
    let cache = Arc::new(FsCacheStore::new());
    let locator = RecordLocator::new(Arc::clone(&store), Arc::new(config.relations.clone()));

    // (B) handler を登録して worker を起動
    let app = AppBuilder::new()
        .register::<ProcessAsset, _>(ProcessAssetHandler::new(
            locator.clone(),
            Arc::clone(&uploader),
        ))?
        .register::<StoreAsset, _>(StoreAssetHandler::new(
            locator,
            Arc::clone(&uploader),
            cache,
        ))?
        .expect_kinds(&[JobKind::Process, JobKind::Store])
        .build()?;

    let queue = Arc::new(InMemoryJobQueue::new(config.queue.retry_policy()));
    let workers = WorkerGroup::spawn(config.worker_count(), queue.clone(), Arc::clone(&app.registry));

    let avatar = BackgroundAsset::process_in_background("User", "image", BackgroundOptions::root());
    let photo_image = BackgroundAsset::store_in_background(
        "Photo",
        "image",
        BackgroundOptions::embedded_many("user", "photos"),
    );
    let field = FieldName::new("image");
    let user_type = TypeName::new("User");
    let user_id = RecordId::new("22");

    // (C) ルートレコード: 即時保存して、バージョン生成だけ後回し
    let mut user = store
        .load(&user_type, &user_id)
        .await?
        .context("seeded user is missing")?;
    uploader
        .assign(
            &mut user,
            &field,
            CachedFile::new("avatar.png", &b"avatar-bytes"[..]),
            SaveMode::Inline,
        )
        .await?;
    avatar.before_save(&mut user, SaveMode::Deferred);
    user.save(SaveMode::Deferred).await?;
    avatar
        .after_save(queue.as_ref(), user.id(), None, SaveMode::Deferred)
        .await?;

    // (D) 埋め込みレコード: キャッシュに置いて、本保存を後回し
    let parent = store
        .load(&user_type, &user_id)
        .await?
        .context("seeded user is missing")?;
    let mut photo = parent
        .find_embedded(&FieldName::new("photos"), &RecordId::new("1"))
        .context("seeded photo is missing")?;
    uploader
        .assign(
            &mut photo,
            &field,
            CachedFile::new("holiday.jpg", &b"photo-bytes"[..]),
            SaveMode::Deferred,
        )
        .await?;
    photo.save(SaveMode::Deferred).await?;
    photo_image
        .after_save(queue.as_ref(), photo.id(), Some(&user_id), SaveMode::Deferred)
        .await?;

    // (E) queue が空になるまで待つ
    let counts = tokio::time::timeout(Duration::from_secs(args.timeout), async {
        loop {
            let counts = queue.counts_by_state().await?;
            if counts.is_drained() {
                return anyhow::Ok(counts);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .context("queue did not drain in time")??;
    workers.shutdown_and_join().await;

    for dead in queue.dead_letters().await {
        info!(
            job_id = %dead.envelope.job_id(),
            error = dead.last_error.as_deref().unwrap_or(""),
            "dead-lettered job"
        );
    }

    let document = store
        .get(&user_type, &user_id)
        .await
        .context("user vanished")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "counts": counts, "user": document }))?
    );
    Ok(())
}
