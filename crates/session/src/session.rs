use deltahub_archive::{Container, Payload};
use deltahub_model::paths::basename;
use deltahub_model::{ChapterKey, DataFile, ExtraFile, MAX_SCREENSHOTS, ModPackage, SlotId, Tag};
use exn::OptionExt;

use crate::error::{ErrorKind, Result};
use crate::registry::SlotRegistry;

/// A package being edited together with the bytes bound to its slots.
///
/// Sessions are values: every operation returns a new session and leaves the
/// receiver unchanged. Removing a file role always unbinds its bytes, and
/// bytes are only ever bound to slots the package declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    package: ModPackage,
    slots: SlotRegistry,
}
impl EditSession {
    pub fn new(package: ModPackage) -> Self {
        Self {
            package,
            slots: SlotRegistry::new(),
        }
    }

    /// Pairs a package with bytes, dropping bindings for undeclared slots.
    pub fn with_slots(package: ModPackage, slots: SlotRegistry) -> Self {
        let session = Self { package, slots };
        let slots = session.slots.retain(|slot| session.declares(slot));
        Self { slots, ..session }
    }

    pub fn package(&self) -> &ModPackage {
        &self.package
    }

    pub fn slots(&self) -> &SlotRegistry {
        &self.slots
    }

    /// Replaces the package metadata through `edit`. File roles edited this
    /// way keep their bytes only while their slots stay declared.
    #[must_use]
    pub fn edit(&self, edit: impl FnOnce(&mut ModPackage)) -> Self {
        let mut package = self.package.clone();
        edit(&mut package);
        Self::with_slots(package, self.slots.clone())
    }

    /// Whether `slot` names a role the package currently declares.
    pub fn declares(&self, slot: &SlotId) -> bool {
        match slot {
            SlotId::Icon => true,
            SlotId::DataFile { chapter } => self.package.chapter(chapter).is_some_and(|set| set.data_file.is_some()),
            SlotId::Extra { chapter, key } => self.package.chapter(chapter).is_some_and(|set| set.extra(key).is_some()),
        }
    }

    /// Sets (or replaces the metadata of) a chapter's data file. Bytes
    /// already bound to the slot stay attached.
    pub fn set_data_file(&self, chapter: ChapterKey, data: DataFile) -> Self {
        self.edit(|package| package.files.entry(chapter).or_default().data_file = Some(data))
    }

    pub fn remove_data_file(&self, chapter: &ChapterKey) -> Self {
        self.edit(|package| {
            if let Some(set) = package.files.get_mut(chapter) {
                set.data_file = None;
            }
            prune(package, chapter);
        })
    }

    pub fn add_extra_file(&self, chapter: ChapterKey, extra: ExtraFile) -> Result<Self> {
        if self.package.chapter(&chapter).is_some_and(|set| set.extra(&extra.key).is_some()) {
            exn::bail!(ErrorKind::DuplicateKey(extra.key));
        }
        Ok(self.edit(|package| package.files.entry(chapter).or_default().extra_files.push(extra)))
    }

    pub fn remove_extra_file(&self, chapter: &ChapterKey, key: &str) -> Self {
        self.edit(|package| {
            if let Some(set) = package.files.get_mut(chapter) {
                set.extra_files.retain(|extra| extra.key != key);
            }
            prune(package, chapter);
        })
    }

    /// Changes the stable key of an extra file, carrying its bytes over to
    /// the new slot.
    pub fn rename_extra_file(&self, chapter: &ChapterKey, key: &str, new_key: &str) -> Result<Self> {
        let from = SlotId::extra(chapter.clone(), key);
        let set = self.package.chapter(chapter).ok_or_raise(|| ErrorKind::UnknownSlot(from.to_string()))?;
        set.extra(key).ok_or_raise(|| ErrorKind::UnknownSlot(from.to_string()))?;
        if key == new_key {
            return Ok(self.clone());
        }
        if set.extra(new_key).is_some() {
            exn::bail!(ErrorKind::DuplicateKey(new_key.to_string()));
        }
        let mut package = self.package.clone();
        if let Some(extra) = package.files.get_mut(chapter).and_then(|set| set.extra_mut(key)) {
            extra.key = new_key.to_string();
        }
        let slots = self.slots.rename(&from, SlotId::extra(chapter.clone(), new_key));
        Ok(Self::with_slots(package, slots))
    }

    /// Changes the file name a slot is published under. The slot id, and
    /// with it the bound bytes, do not change.
    pub fn set_url(&self, slot: &SlotId, url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let mut package = self.package.clone();
        *url_mut(&mut package, slot)? = url;
        Ok(Self::with_slots(package, self.slots.clone()))
    }

    /// Binds bytes to a declared slot.
    ///
    /// A role without a file name yet takes it from the payload: data files
    /// use the file name as is, extra files get a container name.
    pub fn attach(&self, slot: &SlotId, payload: Payload) -> Result<Self> {
        let mut package = self.package.clone();
        if *slot != SlotId::Icon {
            let is_archive = payload.is_archive();
            let file_name = payload.file_name.as_deref().map(basename).filter(|name| !name.is_empty());
            let url = url_mut(&mut package, slot)?;
            if let (true, Some(file_name)) = (url.is_empty(), file_name) {
                *url = match (slot, is_archive) {
                    (SlotId::Extra { .. }, false) => format!("{}.zip", Container::strip_suffix(file_name)),
                    _ => file_name.to_string(),
                };
            }
        }
        let slots = self.slots.set(slot.clone(), Some(payload));
        Ok(Self::with_slots(package, slots))
    }

    pub fn detach(&self, slot: &SlotId) -> Self {
        Self {
            package: self.package.clone(),
            slots: self.slots.set(slot.clone(), None),
        }
    }

    pub fn set_icon(&self, payload: Payload) -> Self {
        Self {
            package: self.package.clone(),
            slots: self.slots.set(SlotId::Icon, Some(payload)),
        }
    }

    pub fn clear_icon(&self) -> Self {
        self.detach(&SlotId::Icon)
    }

    pub fn set_screenshots(&self, urls: Vec<String>) -> Result<Self> {
        if urls.len() > MAX_SCREENSHOTS {
            exn::bail!(ErrorKind::TooManyScreenshots(urls.len()));
        }
        Ok(self.edit(|package| package.screenshots_url = urls))
    }

    pub fn toggle_tag(&self, tag: Tag) -> Self {
        self.edit(|package| {
            if !package.tags.remove(&tag) {
                package.tags.insert(tag);
            }
        })
    }

    /// Checks the export preconditions before any packing starts.
    pub fn ensure_exportable(&self) -> Result<()> {
        if !self.package.is_exportable() {
            exn::bail!(ErrorKind::NotExportable("no chapter has any file".to_string()));
        }
        if self.package.screenshots_url.len() > MAX_SCREENSHOTS {
            exn::bail!(ErrorKind::NotExportable(format!(
                "{} screenshots, at most {MAX_SCREENSHOTS} allowed",
                self.package.screenshots_url.len()
            )));
        }
        Ok(())
    }
}

fn url_mut<'a>(package: &'a mut ModPackage, slot: &SlotId) -> Result<&'a mut String> {
    let unknown = || ErrorKind::UnknownSlot(slot.to_string());
    match slot {
        SlotId::DataFile { chapter } => package
            .files
            .get_mut(chapter)
            .and_then(|set| set.data_file.as_mut())
            .map(|data| &mut data.url)
            .ok_or_raise(unknown),
        SlotId::Extra { chapter, key } => package
            .files
            .get_mut(chapter)
            .and_then(|set| set.extra_mut(key))
            .map(|extra| &mut extra.url)
            .ok_or_raise(unknown),
        SlotId::Icon => exn::bail!(unknown()),
    }
}

// Chapters with no file role left are dropped from the package.
fn prune(package: &mut ModPackage, chapter: &ChapterKey) {
    if package.files.get(chapter).is_some_and(|set| !set.is_populated()) {
        package.files.remove(chapter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deltahub_model::Game;

    fn payload(bytes: &[u8]) -> Payload {
        Payload::new(bytes.to_vec())
    }

    fn session() -> EditSession {
        let session = EditSession::new(ModPackage::new("Session", Game::Deltarune));
        let session = session.set_data_file(ChapterKey::new("1"), DataFile::new("ch1.xdelta", "1.0.0"));
        session
            .add_extra_file(ChapterKey::new("1"), ExtraFile::new("music", "music.zip", "1.0.0"))
            .unwrap()
    }

    #[test]
    fn test_url_rename_keeps_bytes() {
        let slot = SlotId::data_file("1");
        let session = session().attach(&slot, payload(b"delta")).unwrap();
        let renamed = session.set_url(&slot, "renamed.xdelta").unwrap();
        assert_eq!(renamed.package().chapter(&ChapterKey::new("1")).unwrap().data_file.as_ref().unwrap().url, "renamed.xdelta");
        assert_eq!(renamed.slots().get(&slot), Some(&payload(b"delta")));
        // The original value is untouched.
        assert_eq!(session.package().chapter(&ChapterKey::new("1")).unwrap().data_file.as_ref().unwrap().url, "ch1.xdelta");
    }

    #[test]
    fn test_remove_detaches_bytes() {
        let session = session()
            .attach(&SlotId::data_file("1"), payload(b"delta"))
            .unwrap()
            .attach(&SlotId::extra("1", "music"), payload(b"music"))
            .unwrap();
        let without_data = session.remove_data_file(&ChapterKey::new("1"));
        assert!(!without_data.slots().contains(&SlotId::data_file("1")));
        assert!(without_data.slots().contains(&SlotId::extra("1", "music")));

        let empty = without_data.remove_extra_file(&ChapterKey::new("1"), "music");
        assert!(empty.slots().is_empty());
        assert!(empty.package().files.is_empty());
    }

    #[test]
    fn test_duplicate_extra_key() {
        let err = session()
            .add_extra_file(ChapterKey::new("1"), ExtraFile::new("music", "other.zip", "1.0.0"))
            .unwrap_err();
        assert_eq!(*err, ErrorKind::DuplicateKey("music".to_string()));
    }

    #[test]
    fn test_rename_extra_file() {
        let chapter = ChapterKey::new("1");
        let session = session().attach(&SlotId::extra("1", "music"), payload(b"ogg")).unwrap();
        let renamed = session.rename_extra_file(&chapter, "music", "soundtrack").unwrap();
        assert!(renamed.package().chapter(&chapter).unwrap().extra("soundtrack").is_some());
        assert_eq!(renamed.slots().get(&SlotId::extra("1", "soundtrack")), Some(&payload(b"ogg")));
        assert!(!renamed.slots().contains(&SlotId::extra("1", "music")));

        let taken = renamed
            .add_extra_file(chapter.clone(), ExtraFile::new("music", "music.zip", "1.0.0"))
            .unwrap();
        let err = taken.rename_extra_file(&chapter, "music", "soundtrack").unwrap_err();
        assert_eq!(*err, ErrorKind::DuplicateKey("soundtrack".to_string()));
        let err = taken.rename_extra_file(&chapter, "nope", "x").unwrap_err();
        assert_eq!(*err, ErrorKind::UnknownSlot("1:extra:nope".to_string()));
    }

    #[test]
    fn test_attach_unknown_slot() {
        let err = session().attach(&SlotId::data_file("2"), payload(b"x")).unwrap_err();
        assert_eq!(*err, ErrorKind::UnknownSlot("2:data_file".to_string()));
    }

    #[test]
    fn test_attach_fills_missing_url() {
        let session = EditSession::new(ModPackage::new("Fill", Game::Deltarune))
            .set_data_file(ChapterKey::new("2"), DataFile::new("", "1.0.0"))
            .add_extra_file(ChapterKey::new("2"), ExtraFile::new("lang", "", "1.0.0"))
            .unwrap()
            .attach(&SlotId::data_file("2"), payload(b"d").with_file_name("dir/ch2.xdelta"))
            .unwrap()
            .attach(&SlotId::extra("2", "lang"), payload(b"{}").with_file_name("en.json"))
            .unwrap();
        let set = session.package().chapter(&ChapterKey::new("2")).unwrap();
        assert_eq!(set.data_file.as_ref().unwrap().url, "ch2.xdelta");
        assert_eq!(set.extra("lang").unwrap().url, "en.zip");
    }

    #[test]
    fn test_icon() {
        let session = session().set_icon(payload(b"png"));
        assert!(session.slots().contains(&SlotId::Icon));
        assert!(session.clear_icon().slots().is_empty());
    }

    #[test]
    fn test_edit_drops_undeclared_bytes() {
        let session = session().attach(&SlotId::extra("1", "music"), payload(b"ogg")).unwrap();
        let edited = session.edit(|package| package.files.clear());
        assert!(edited.slots().is_empty());
    }

    #[test]
    fn test_screenshots_and_tags() {
        let urls = |n| (0..n).map(|i| format!("https://example.com/{i}.png")).collect::<Vec<_>>();
        assert_eq!(session().set_screenshots(urls(10)).unwrap().package().screenshots_url.len(), 10);
        let err = session().set_screenshots(urls(11)).unwrap_err();
        assert_eq!(*err, ErrorKind::TooManyScreenshots(11));

        let tagged = session().toggle_tag(Tag::Gameplay);
        assert!(tagged.package().tags.contains(&Tag::Gameplay));
        assert!(tagged.toggle_tag(Tag::Gameplay).package().tags.is_empty());
    }

    #[test]
    fn test_ensure_exportable() {
        let empty = EditSession::new(ModPackage::new("Empty", Game::Deltarune));
        assert!(matches!(&*empty.ensure_exportable().unwrap_err(), ErrorKind::NotExportable(_)));
        assert!(session().ensure_exportable().is_ok());

        let crowded = session().edit(|package| package.screenshots_url = vec![String::new(); 11]);
        assert!(matches!(&*crowded.ensure_exportable().unwrap_err(), ErrorKind::NotExportable(_)));
    }
}
