//! Document store: discovers notes under a root, extracts them, and holds
//! the current [`Corpus`].
//!
//! A load builds a complete new corpus (documents and index together) off to
//! the side and swaps it in with a single pointer store. Readers hold an
//! `Arc<Corpus>` and keep seeing the generation they started with.

use crate::config::Config;
use crate::document::{DocPath, ParseWarning, SkillDocument, WarningKind};
use crate::error::{MnemoError, Result};
use crate::extract::{extract_with_warnings, Extraction};
use crate::index::Index;
use crate::query::{self, SearchFilters, SearchHit};
use crate::snapshot;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::{btree_map, BTreeMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// CancelToken
// ---------------------------------------------------------------------------

/// Shared flag that abandons an in-flight reload before it swaps.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Corpus
// ---------------------------------------------------------------------------

/// One complete, immutable load pass.
#[derive(Debug)]
pub struct Corpus {
    root: PathBuf,
    generation: u64,
    loaded_at: DateTime<Utc>,
    from_snapshot: bool,
    documents: BTreeMap<DocPath, Arc<SkillDocument>>,
    /// Lowercased skill name to the first note (by path) carrying it.
    names: BTreeMap<String, DocPath>,
    index: Index,
    warnings: Vec<ParseWarning>,
}

impl Corpus {
    fn assemble(
        root: PathBuf,
        generation: u64,
        mut documents: Vec<SkillDocument>,
        mut warnings: Vec<ParseWarning>,
        from_snapshot: bool,
    ) -> Self {
        documents.sort_by(|a, b| a.path.cmp(&b.path));

        let mut by_path: BTreeMap<DocPath, Arc<SkillDocument>> = BTreeMap::new();
        for doc in documents {
            match by_path.entry(doc.path.clone()) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(Arc::new(doc));
                }
                btree_map::Entry::Occupied(_) => {
                    let w = ParseWarning {
                        path: doc.path.clone(),
                        kind: WarningKind::DuplicatePath,
                        message: "another file maps to the same note path; kept the first"
                            .to_string(),
                    };
                    tracing::warn!(path = %w.path, kind = %w.kind, "{}", w.message);
                    warnings.push(w);
                }
            }
        }

        let mut names = BTreeMap::new();
        for (path, doc) in &by_path {
            names
                .entry(doc.skill_name().to_lowercase())
                .or_insert_with(|| path.clone());
        }

        let index = Index::build(by_path.values().map(|d| d.as_ref()));
        warnings.sort_by(|a, b| a.path.cmp(&b.path));

        Self {
            root,
            generation,
            loaded_at: Utc::now(),
            from_snapshot,
            documents: by_path,
            names,
            index,
            warnings,
        }
    }

    /// An empty corpus, used before the first load completes.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self::assemble(root.into(), 0, Vec::new(), Vec::new(), false)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Monotonic load-pass number; every document in this corpus came from it.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn from_snapshot(&self) -> bool {
        self.from_snapshot
    }

    pub fn get(&self, path: &DocPath) -> Option<&Arc<SkillDocument>> {
        self.documents.get(path)
    }

    /// All documents in path order. Call again to restart.
    pub fn documents(&self) -> btree_map::Values<'_, DocPath, Arc<SkillDocument>> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Resolve a related-skill name to a note, if one carries that name.
    pub fn resolve_link(&self, name: &str) -> Option<&Arc<SkillDocument>> {
        let path = self.names.get(&name.trim().to_lowercase())?;
        self.documents.get(path)
    }

    pub fn search(&self, query: &str, filters: &SearchFilters) -> Vec<&SkillDocument> {
        query::search(self, query, filters)
    }

    pub fn search_ranked(&self, query: &str, filters: &SearchFilters) -> Vec<SearchHit<'_>> {
        query::search_ranked(self, query, filters)
    }
}

/// Restartable view over one corpus generation.
#[derive(Debug, Clone)]
pub struct AllDocuments {
    corpus: Arc<Corpus>,
}

impl AllDocuments {
    pub fn iter(&self) -> btree_map::Values<'_, DocPath, Arc<SkillDocument>> {
        self.corpus.documents()
    }

    pub fn generation(&self) -> u64 {
        self.corpus.generation()
    }
}

impl<'a> IntoIterator for &'a AllDocuments {
    type Item = &'a Arc<SkillDocument>;
    type IntoIter = btree_map::Values<'a, DocPath, Arc<SkillDocument>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

/// Reads one note file's bytes.
pub(crate) type ReadFn = fn(&Path) -> std::io::Result<Vec<u8>>;

fn read_file(path: &Path) -> std::io::Result<Vec<u8>> {
    std::fs::read(path)
}

pub struct DocumentStore {
    root: PathBuf,
    config: Config,
    read: ReadFn,
    current: RwLock<Arc<Corpus>>,
    generation: AtomicU64,
}

impl DocumentStore {
    /// Open the store at `root` with `.mnemo/config.yaml` (or defaults) and
    /// perform the first load.
    pub fn load(root: &Path) -> Result<Self> {
        ensure_root_readable(root)?;
        let config = Config::load(root)?;
        Self::load_with(root, config)
    }

    pub fn load_with(root: &Path, config: Config) -> Result<Self> {
        Self::load_with_reader(root, config, read_file)
    }

    pub(crate) fn load_with_reader(root: &Path, config: Config, read: ReadFn) -> Result<Self> {
        let store = Self {
            root: root.to_path_buf(),
            config,
            read,
            current: RwLock::new(Arc::new(Corpus::empty(root))),
            generation: AtomicU64::new(0),
        };
        store.reload()?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The current corpus. Cheap; holds the generation alive for the caller.
    pub fn snapshot(&self) -> Arc<Corpus> {
        Arc::clone(&self.current.read())
    }

    pub fn get(&self, path: &DocPath) -> Option<Arc<SkillDocument>> {
        self.snapshot().get(path).cloned()
    }

    pub fn all(&self) -> AllDocuments {
        AllDocuments {
            corpus: self.snapshot(),
        }
    }

    pub fn reload(&self) -> Result<Arc<Corpus>> {
        self.reload_with(&CancelToken::new())
    }

    /// Rebuild the corpus from disk and swap it in. On error or
    /// cancellation the previous corpus stays current.
    pub fn reload_with(&self, cancel: &CancelToken) -> Result<Arc<Corpus>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let corpus = Arc::new(build_corpus(&self.root, &self.config, self.read, generation, cancel)?);

        if cancel.is_cancelled() {
            tracing::info!(generation, "reload abandoned before swap");
            return Err(MnemoError::ReloadAbandoned);
        }

        {
            let mut current = self.current.write();
            // A slower reload must not replace a newer one that finished first.
            if current.generation() > corpus.generation() {
                tracing::debug!(generation, "discarding stale reload");
                return Ok(Arc::clone(&current));
            }
            *current = Arc::clone(&corpus);
        }

        tracing::info!(
            generation,
            documents = corpus.len(),
            warnings = corpus.warnings().len(),
            from_snapshot = corpus.from_snapshot(),
            "notes loaded"
        );
        Ok(corpus)
    }
}

// ---------------------------------------------------------------------------
// Load pipeline
// ---------------------------------------------------------------------------

enum FileOutcome {
    Parsed(Extraction),
    Skipped(ParseWarning),
}

fn ensure_root_readable(root: &Path) -> Result<()> {
    let unreadable = |reason: String| MnemoError::RootUnreadable {
        path: root.to_path_buf(),
        reason,
    };
    let meta = std::fs::metadata(root).map_err(|e| unreadable(e.to_string()))?;
    if !meta.is_dir() {
        return Err(unreadable("not a directory".to_string()));
    }
    std::fs::read_dir(root).map_err(|e| unreadable(e.to_string()))?;
    Ok(())
}

fn build_corpus(
    root: &Path,
    config: &Config,
    read: ReadFn,
    generation: u64,
    cancel: &CancelToken,
) -> Result<Corpus> {
    ensure_root_readable(root)?;
    let files = discover(root, config);
    tracing::debug!(root = %root.display(), files = files.len(), "discovered notes");

    let stamps = if config.snapshot {
        snapshot::stamp_files(root, &files)
    } else {
        None
    };
    if let Some(stamps) = &stamps {
        if let Some(cached) = snapshot::load_matching(root, stamps) {
            return Ok(Corpus::assemble(
                root.to_path_buf(),
                generation,
                cached.documents,
                cached.warnings,
                true,
            ));
        }
    }

    let timeout = config.read_timeout();
    let process = |file: &PathBuf| -> Option<FileOutcome> {
        if cancel.is_cancelled() {
            return None;
        }
        Some(process_file(root, file, read, timeout))
    };
    let outcomes: Vec<FileOutcome> = if config.parallel {
        files.par_iter().filter_map(process).collect()
    } else {
        files.iter().filter_map(process).collect()
    };

    if cancel.is_cancelled() {
        return Err(MnemoError::ReloadAbandoned);
    }

    let mut documents = Vec::with_capacity(outcomes.len());
    let mut warnings = Vec::new();
    let mut failed = 0usize;
    for outcome in outcomes {
        match outcome {
            FileOutcome::Parsed(ex) => {
                for w in &ex.warnings {
                    tracing::warn!(path = %w.path, kind = %w.kind, "{}", w.message);
                }
                warnings.extend(ex.warnings);
                documents.push(ex.document);
            }
            FileOutcome::Skipped(w) => {
                tracing::warn!(path = %w.path, kind = %w.kind, "{}", w.message);
                failed += 1;
                warnings.push(w);
            }
        }
    }

    if !files.is_empty() && documents.is_empty() {
        return Err(MnemoError::NothingReadable {
            path: root.to_path_buf(),
            failed,
        });
    }

    // A cached pass with skipped files would hide them from later loads.
    match &stamps {
        Some(_) if failed > 0 => {
            tracing::debug!(failed, "not writing snapshot: some notes were skipped");
        }
        Some(stamps) => {
            if let Err(e) = snapshot::save(root, stamps, &documents, &warnings) {
                tracing::warn!(error = %e, "failed to write snapshot");
            }
        }
        None => {}
    }

    Ok(Corpus::assemble(
        root.to_path_buf(),
        generation,
        documents,
        warnings,
        false,
    ))
}

/// Note files under `root` in file-name order.
fn discover(root: &Path, config: &Config) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !(config.skip_hidden && is_hidden(e)))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && config.is_note_file(e.path()))
        .map(|e| e.into_path())
        .collect()
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn process_file(root: &Path, file: &Path, read: ReadFn, timeout: Option<Duration>) -> FileOutcome {
    let rel = file.strip_prefix(root).unwrap_or(file);
    let path = DocPath::from_relative(rel);
    tracing::debug!(path = %path, "reading note");

    match read_with_timeout(file, read, timeout) {
        Ok(bytes) => {
            let raw = String::from_utf8_lossy(&bytes);
            FileOutcome::Parsed(extract_with_warnings(&raw, path))
        }
        Err(ReadFailure::TimedOut(after)) => FileOutcome::Skipped(ParseWarning {
            path,
            kind: WarningKind::TimedOut,
            message: format!("read did not finish within {}ms; skipped", after.as_millis()),
        }),
        Err(ReadFailure::Io(e)) => FileOutcome::Skipped(ParseWarning {
            path,
            kind: WarningKind::Unreadable,
            message: format!("cannot read file: {e}; skipped"),
        }),
    }
}

enum ReadFailure {
    Io(std::io::Error),
    TimedOut(Duration),
}

/// Read a file, giving up after `timeout`. The read runs on a helper thread
/// so a hung filesystem cannot stall the load; an abandoned thread finishes
/// (or hangs) on its own.
fn read_with_timeout(
    file: &Path,
    read: ReadFn,
    timeout: Option<Duration>,
) -> std::result::Result<Vec<u8>, ReadFailure> {
    let Some(timeout) = timeout else {
        return read(file).map_err(ReadFailure::Io);
    };

    let (tx, rx) = crossbeam_channel::bounded(1);
    let owned = file.to_path_buf();
    let spawned = std::thread::Builder::new()
        .name("mnemo-read".to_string())
        .spawn(move || {
            let _ = tx.send(read(&owned));
        });
    if let Err(e) = spawned {
        tracing::debug!(error = %e, "read thread unavailable; reading inline");
        return read(file).map_err(ReadFailure::Io);
    }

    match rx.recv_timeout(timeout) {
        Ok(result) => result.map_err(ReadFailure::Io),
        Err(crossbeam_channel::RecvTimeoutError::Timeout) => Err(ReadFailure::TimedOut(timeout)),
        Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Err(ReadFailure::Io(
            std::io::Error::other("read thread exited without a result"),
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn seeded() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "plugins/debugging/x.md",
            "# Watcher Race\n\n## Related Skills\n- race-condition\n",
        );
        write(dir.path(), "plugins/ci-cd/y.md", "# Cache Keys\n");
        dir
    }

    #[test]
    fn load_reads_all_notes() {
        let dir = seeded();
        let store = DocumentStore::load(dir.path()).unwrap();
        let paths: Vec<String> = store.all().iter().map(|d| d.path.to_string()).collect();
        assert_eq!(paths, vec!["plugins/ci-cd/y", "plugins/debugging/x"]);
        assert_eq!(store.snapshot().generation(), 1);
    }

    #[test]
    fn get_unknown_path_is_none() {
        let dir = seeded();
        let store = DocumentStore::load(dir.path()).unwrap();
        assert!(store.get(&DocPath::parse("plugins/debugging/x")).is_some());
        assert!(store.get(&DocPath::parse("plugins/nope/z")).is_none());
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = DocumentStore::load(&dir.path().join("absent")).err().unwrap();
        assert!(matches!(err, MnemoError::RootUnreadable { .. }));
        assert!(err.to_string().contains("absent"));
    }

    #[test]
    fn file_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.md");
        std::fs::write(&file, "# x").unwrap();
        assert!(matches!(
            DocumentStore::load(&file),
            Err(MnemoError::RootUnreadable { .. })
        ));
    }

    #[test]
    fn empty_root_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = DocumentStore::load(dir.path()).unwrap();
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn hidden_and_foreign_files_are_skipped() {
        let dir = seeded();
        write(dir.path(), ".git/notes.md", "# hidden\n");
        write(dir.path(), "plugins/debugging/.draft.md", "# hidden\n");
        write(dir.path(), "plugins/debugging/x/.claude-plugin/plugin.json", "{}");
        let store = DocumentStore::load(dir.path()).unwrap();
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn malformed_header_is_warning_not_failure() {
        let dir = seeded();
        write(dir.path(), "plugins/tooling/z.md", "---\nname: [\n---\n# Z Title\n");
        let store = DocumentStore::load(dir.path()).unwrap();
        let corpus = store.snapshot();
        let z = corpus.get(&DocPath::parse("plugins/tooling/z")).unwrap();
        assert_eq!(z.title, "Z Title");
        assert_eq!(corpus.warnings().len(), 1);
        assert_eq!(corpus.warnings()[0].kind, WarningKind::MalformedHeader);
    }

    #[test]
    fn duplicate_paths_keep_first_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "notes/a.md", "# From md\n");
        write(dir.path(), "notes/a.markdown", "# From markdown\n");
        let mut config = Config::default();
        config.extensions = vec!["md".to_string(), "markdown".to_string()];
        let store = DocumentStore::load_with(dir.path(), config).unwrap();
        let corpus = store.snapshot();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.warnings()[0].kind, WarningKind::DuplicatePath);
    }

    #[test]
    fn reload_swaps_whole_corpus() {
        let dir = seeded();
        let store = DocumentStore::load(dir.path()).unwrap();
        let before = store.snapshot();

        write(dir.path(), "plugins/testing/new.md", "# New\n");
        std::fs::remove_file(dir.path().join("plugins/ci-cd/y.md")).unwrap();
        let after = store.reload().unwrap();

        // The old handle still sees exactly the old pass.
        let old: BTreeSet<String> = before.documents().map(|d| d.path.to_string()).collect();
        assert_eq!(
            old,
            BTreeSet::from(["plugins/ci-cd/y".to_string(), "plugins/debugging/x".to_string()])
        );
        let new: BTreeSet<String> = after.documents().map(|d| d.path.to_string()).collect();
        assert_eq!(
            new,
            BTreeSet::from([
                "plugins/debugging/x".to_string(),
                "plugins/testing/new".to_string()
            ])
        );
        assert_eq!(after.generation(), before.generation() + 1);
        assert!(after.index().in_category("ci-cd").is_empty());
        assert_eq!(before.index().in_category("ci-cd").len(), 1);
    }

    #[test]
    fn cancelled_reload_keeps_previous_corpus() {
        let dir = seeded();
        let store = DocumentStore::load(dir.path()).unwrap();
        write(dir.path(), "plugins/testing/new.md", "# New\n");

        let cancel = CancelToken::new();
        cancel.cancel();
        let err = store.reload_with(&cancel).err().unwrap();
        assert!(matches!(err, MnemoError::ReloadAbandoned));
        assert_eq!(store.snapshot().len(), 2);
        assert_eq!(store.snapshot().generation(), 1);
    }

    #[test]
    fn reload_after_root_removed_keeps_previous_corpus() {
        let dir = seeded();
        let store = DocumentStore::load(dir.path()).unwrap();
        std::fs::remove_dir_all(dir.path().join("plugins")).unwrap();
        std::fs::remove_dir(dir.path()).unwrap();
        assert!(store.reload().is_err());
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn sequential_and_parallel_loads_agree() {
        let dir = seeded();
        for i in 0..20 {
            write(dir.path(), &format!("plugins/tooling/n{i}.md"), &format!("# N{i}\n"));
        }
        let mut seq = Config::default();
        seq.parallel = false;
        let a = DocumentStore::load_with(dir.path(), seq).unwrap().snapshot();
        let b = DocumentStore::load_with(dir.path(), Config::default()).unwrap().snapshot();
        let pa: Vec<_> = a.documents().map(|d| d.as_ref().clone()).collect();
        let pb: Vec<_> = b.documents().map(|d| d.as_ref().clone()).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn resolve_link_by_skill_name() {
        let dir = seeded();
        write(
            dir.path(),
            "plugins/debugging/race-condition/skills/race-condition/SKILL.md",
            "# Races\n",
        );
        let store = DocumentStore::load(dir.path()).unwrap();
        let corpus = store.snapshot();
        let hit = corpus.resolve_link("Race-Condition").unwrap();
        assert_eq!(
            hit.path.to_string(),
            "plugins/debugging/race-condition/skills/race-condition/SKILL"
        );
        assert!(corpus.resolve_link("missing-skill").is_none());
    }

    // -----------------------------------------------------------------------
    // Failed reads
    // -----------------------------------------------------------------------

    fn refuse_locked(path: &Path) -> std::io::Result<Vec<u8>> {
        let locked = path
            .file_stem()
            .is_some_and(|s| s.to_string_lossy().starts_with("locked"));
        if locked {
            return Err(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "permission denied",
            ));
        }
        std::fs::read(path)
    }

    fn stall_slow(path: &Path) -> std::io::Result<Vec<u8>> {
        if path.file_stem().is_some_and(|s| s == "slow") {
            std::thread::sleep(Duration::from_millis(500));
        }
        std::fs::read(path)
    }

    #[test]
    fn unreadable_file_is_skipped_with_warning() {
        let dir = seeded();
        write(dir.path(), "plugins/tooling/locked.md", "# Locked
");
        let store =
            DocumentStore::load_with_reader(dir.path(), Config::default(), refuse_locked).unwrap();
        let corpus = store.snapshot();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.warnings().len(), 1);
        let w = &corpus.warnings()[0];
        assert_eq!(w.kind, WarningKind::Unreadable);
        assert_eq!(w.path.to_string(), "plugins/tooling/locked");
        assert!(w.message.contains("permission denied"));
    }

    #[test]
    fn slow_read_times_out_and_is_skipped() {
        let dir = seeded();
        write(dir.path(), "plugins/tooling/slow.md", "# Slow
");
        let mut config = Config::default();
        config.read_timeout_ms = 50;
        let store = DocumentStore::load_with_reader(dir.path(), config, stall_slow).unwrap();
        let corpus = store.snapshot();
        assert_eq!(corpus.len(), 2);
        assert!(corpus.get(&DocPath::parse("plugins/tooling/slow")).is_none());
        assert_eq!(corpus.warnings().len(), 1);
        assert_eq!(corpus.warnings()[0].kind, WarningKind::TimedOut);
    }

    #[test]
    fn read_with_timeout_gives_up() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("slow.md");
        std::fs::write(&file, "# Slow\n").unwrap();
        assert!(matches!(
            read_with_timeout(&file, stall_slow, Some(Duration::from_millis(20))),
            Err(ReadFailure::TimedOut(_))
        ));
        assert!(matches!(
            read_with_timeout(&file, stall_slow, None),
            Ok(bytes) if bytes == b"# Slow\n"
        ));
        let missing = dir.path().join("missing.md");
        assert!(matches!(
            read_with_timeout(&missing, read_file, Some(Duration::from_secs(5))),
            Err(ReadFailure::Io(_))
        ));
    }

    #[test]
    fn nothing_readable_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "plugins/tooling/locked-a.md", "# A\n");
        write(dir.path(), "plugins/tooling/locked-b.md", "# B\n");
        let err = DocumentStore::load_with_reader(dir.path(), Config::default(), refuse_locked)
            .err()
            .unwrap();
        assert!(matches!(err, MnemoError::NothingReadable { failed: 2, .. }));
    }

    #[test]
    fn skipped_files_are_not_cached() {
        let dir = seeded();
        write(dir.path(), "plugins/tooling/locked.md", "# Locked\n");
        let mut config = Config::default();
        config.snapshot = true;

        let first =
            DocumentStore::load_with_reader(dir.path(), config.clone(), refuse_locked).unwrap();
        assert_eq!(first.snapshot().len(), 2);
        assert!(!crate::paths::snapshot_path(dir.path()).exists());

        // Readable again: the file comes back and the pass is cached.
        let second = DocumentStore::load_with(dir.path(), config.clone()).unwrap();
        let corpus = second.snapshot();
        assert!(!corpus.from_snapshot());
        assert_eq!(corpus.len(), 3);
        assert!(corpus.warnings().is_empty());

        let third = DocumentStore::load_with(dir.path(), config).unwrap();
        assert!(third.snapshot().from_snapshot());
        assert_eq!(third.snapshot().len(), 3);
    }

    // -----------------------------------------------------------------------
    // Concurrent reloads
    // -----------------------------------------------------------------------

    static GATE_ARMED: AtomicBool = AtomicBool::new(false);
    static GATE_ENTERED: AtomicBool = AtomicBool::new(false);
    static GATE_OPEN: AtomicBool = AtomicBool::new(false);

    /// Blocks on `gate.md` while armed, until opened.
    fn gated(path: &Path) -> std::io::Result<Vec<u8>> {
        if path.file_stem().is_some_and(|s| s == "gate") && GATE_ARMED.load(Ordering::SeqCst) {
            GATE_ENTERED.store(true, Ordering::SeqCst);
            while !GATE_OPEN.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(1));
            }
        }
        std::fs::read(path)
    }

    #[test]
    fn stale_reload_does_not_replace_newer() {
        let dir = seeded();
        write(dir.path(), "plugins/tooling/gate.md", "# Gate\n");
        let mut config = Config::default();
        config.parallel = false;
        config.read_timeout_ms = 0;
        let store = DocumentStore::load_with_reader(dir.path(), config, gated).unwrap();
        assert_eq!(store.snapshot().generation(), 1);

        GATE_ARMED.store(true, Ordering::SeqCst);
        std::thread::scope(|s| {
            let slow = s.spawn(|| store.reload());
            while !GATE_ENTERED.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(1));
            }
            GATE_ARMED.store(false, Ordering::SeqCst);

            write(dir.path(), "plugins/testing/late.md", "# Late\n");
            let fast = store.reload().unwrap();
            assert_eq!(fast.generation(), 3);
            assert_eq!(fast.len(), 4);

            GATE_OPEN.store(true, Ordering::SeqCst);
            let kept = slow.join().unwrap().unwrap();
            assert_eq!(kept.generation(), 3);
        });

        let current = store.snapshot();
        assert_eq!(current.generation(), 3);
        assert_eq!(current.len(), 4);
    }

    fn write_version(root: &Path, version: u32) {
        for i in 0..6 {
            write(
                root,
                &format!("plugins/tooling/n{i}.md"),
                &format!("# N{i}\n\nmarker v{version}\n"),
            );
        }
    }

    #[test]
    fn readers_never_see_mixed_generations() {
        let dir = TempDir::new().unwrap();
        write_version(dir.path(), 0);
        let store = DocumentStore::load(dir.path()).unwrap();
        let done = AtomicBool::new(false);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let mut last = 0;
                    while !done.load(Ordering::SeqCst) {
                        let corpus = store.snapshot();
                        assert!(corpus.generation() >= last);
                        last = corpus.generation();

                        let markers: BTreeSet<&str> = corpus
                            .documents()
                            .filter_map(|d| d.body.lines().last())
                            .collect();
                        assert_eq!(markers.len(), 1, "{markers:?}");
                        let version = markers
                            .iter()
                            .next()
                            .unwrap()
                            .trim_start_matches("marker ");
                        assert_eq!(corpus.index().lookup(version).len(), corpus.len());
                    }
                });
            }
            for version in 1..=10 {
                write_version(dir.path(), version);
                store.reload().unwrap();
            }
            done.store(true, Ordering::SeqCst);
        });

        assert_eq!(store.snapshot().generation(), 11);
    }

    #[test]
    fn all_is_restartable() {
        let dir = seeded();
        let store = DocumentStore::load(dir.path()).unwrap();
        let all = store.all();
        let first: Vec<_> = all.iter().map(|d| d.path.clone()).collect();
        let second: Vec<_> = (&all).into_iter().map(|d| d.path.clone()).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
