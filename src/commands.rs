use std::path::{Path, PathBuf};

use deltahub_archive::Payload;
use deltahub_config::{PackageSettings, RemoteSettings};
use deltahub_model::{ChapterKey, ModPackage, SlotId};
use deltahub_remote::{HttpApi, RemoteApi, SecretKey};
use deltahub_session::{EditSession, ImportSource, Imported, MatchKind};
use exn::{OptionExt, ResultExt};
use tracing::{info, instrument, warn};

use crate::error::{ErrorKind, Result};

/// A `--slot SLOT=FILE` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub slot: SlotId,
    pub path: PathBuf,
}

pub fn parse_binding(raw: &str) -> Result<Binding> {
    let invalid = || ErrorKind::InvalidArgument(format!("expected SLOT=FILE, found '{raw}'"));
    let (slot, path) = raw.split_once('=').ok_or_raise(invalid)?;
    if path.is_empty() {
        exn::bail!(invalid());
    }
    let slot = slot.parse::<SlotId>().map_err(|err| err.raise(invalid()))?;
    Ok(Binding {
        slot,
        path: PathBuf::from(path),
    })
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.or_raise(|| ErrorKind::Io(path.to_path_buf()))
}

async fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes).await.or_raise(|| ErrorKind::Io(path.to_path_buf()))
}

async fn import(path: &Path) -> Result<Imported> {
    let blob = read(path).await?;
    deltahub_session::import(blob).await.map_err(ErrorKind::session)
}

/// Populated chapters the package's game has no tab for.
fn unexpected_chapters(package: &ModPackage) -> Vec<&ChapterKey> {
    let tabs = package.game.chapters();
    package
        .populated_chapters()
        .map(|(chapter, _)| chapter)
        .filter(|chapter| !tabs.contains(&chapter.as_str()) && !tabs.contains(&chapter.folder_name(package.game).as_str()))
        .collect()
}

#[instrument(fields(archive = %archive.display()))]
pub async fn inspect(archive: &Path) -> Result<()> {
    let imported = import(archive).await?;
    let package = imported.session.package();
    let source = match imported.source {
        ImportSource::Canonical => "canonical",
        ImportSource::Foreign => "foreign",
    };
    println!("{} {} by {} ({source}, {})", package.name, package.version, package.author, package.game.as_str());
    for (chapter, set) in &package.files {
        println!("chapter {chapter}");
        if let Some(data) = &set.data_file {
            println!("  data_file   {} ({})", data.url, data.version);
        }
        for extra in &set.extra_files {
            println!("  extra {:<12} {} ({})", extra.key, extra.url, extra.version);
        }
    }
    for chapter in unexpected_chapters(package) {
        warn!(%chapter, game = %package.game, "chapter is not used by this game");
    }
    for slot in package.slots() {
        let found = match imported.mapping.get(&slot) {
            Some(found) if found.kind == MatchKind::Exact => found.path.clone(),
            Some(found) => format!("{} (guessed)", found.path),
            None => "missing".to_string(),
        };
        println!("{slot:<24} {found}");
    }
    Ok(())
}

#[instrument(fields(archive = %archive.display(), output = %output.display()))]
pub async fn convert(archive: &Path, output: &Path) -> Result<()> {
    let imported = import(archive).await?;
    let blob = deltahub_session::export(&imported.session).await.map_err(ErrorKind::session)?;
    write(output, &blob).await?;
    info!(size = blob.len(), "archive written");
    Ok(())
}

/// Fills fields a hand-written config may leave blank.
fn apply_defaults(package: &mut ModPackage, defaults: &PackageSettings) {
    if package.game_version.trim().is_empty() {
        package.game_version = defaults.default_game_version.clone();
    }
    if package.version.trim().is_empty() {
        package.version = defaults.default_version.clone();
    }
}

#[instrument(skip(bindings, defaults), fields(config = %config.display(), output = %output.display(), slots = bindings.len()))]
pub async fn pack(config: &Path, bindings: &[Binding], output: &Path, defaults: &PackageSettings) -> Result<()> {
    let text = read(config).await?;
    let mut package: ModPackage = serde_json::from_slice(&text).or_raise(|| ErrorKind::InvalidArgument(format!("{} is not a mod config", config.display())))?;
    apply_defaults(&mut package, defaults);

    let mut session = EditSession::new(package);
    for binding in bindings {
        let bytes = read(&binding.path).await?;
        let mut payload = Payload::new(bytes);
        if let Some(name) = binding.path.file_name().and_then(|name| name.to_str()) {
            payload = payload.with_file_name(name);
        }
        session = match binding.slot {
            SlotId::Icon => session.set_icon(payload),
            _ => session.attach(&binding.slot, payload).map_err(ErrorKind::session)?,
        };
    }

    let blob = deltahub_session::export(&session).await.map_err(ErrorKind::session)?;
    write(output, &blob).await?;
    info!(size = blob.len(), "archive written");
    Ok(())
}

pub fn connect(settings: &RemoteSettings) -> Result<HttpApi> {
    HttpApi::new(&settings.base_url, &settings.referer, settings.timeout()).map_err(ErrorKind::remote)
}

pub async fn fetch(api: &dyn RemoteApi, key: &str) -> Result<ModPackage> {
    let key = key.parse::<SecretKey>().map_err(ErrorKind::remote)?;
    deltahub_remote::load_public(api, &key).await.map_err(ErrorKind::remote)
}

#[instrument(skip(api, key), fields(archive = %archive.display(), change = key.is_some()))]
/// Submits an archive's package. Returns the secret key of a new mod.
pub async fn submit(api: &dyn RemoteApi, archive: &Path, key: Option<&str>) -> Result<Option<SecretKey>> {
    let imported = import(archive).await?;
    imported.session.ensure_exportable().map_err(ErrorKind::session)?;
    let package = imported.session.package();
    match key {
        Some(key) => {
            let key = key.parse::<SecretKey>().map_err(ErrorKind::remote)?;
            deltahub_remote::publish_change(api, package, &key).await.map_err(ErrorKind::remote)?;
            info!("change request submitted");
            Ok(None)
        },
        None => {
            let key = deltahub_remote::publish_new(api, package).await.map_err(ErrorKind::remote)?;
            info!("mod submitted; keep the secret key, it is the only way to edit the mod");
            Ok(Some(key))
        },
    }
}
