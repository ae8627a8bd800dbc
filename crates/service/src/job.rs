use std::path::{Path, PathBuf};

use common::types::Language;
use configs::{AppConfig, CatalogConfig};
use tracing::{error, info, warn};

use crate::errors::ServiceError;
use crate::storage::catalog_store::CatalogStore;
use crate::translator::Translator;

/// Knobs for processing one catalog, taken from `[catalog]` plus the CLI.
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub marker: String,
    pub ai_tag: String,
    pub backup_suffix: String,
    pub indent: usize,
    pub dry_run: bool,
}

impl JobOptions {
    pub fn from_config(cfg: &CatalogConfig, dry_run: bool) -> Self {
        Self {
            marker: cfg.marker.clone(),
            ai_tag: cfg.ai_tag.clone(),
            backup_suffix: cfg.backup_suffix.clone(),
            indent: cfg.indent,
            dry_run,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The catalog file does not exist.
    Missing,
    /// No key carries the marker; the file was not touched.
    NothingToDo,
    /// Dry run: this many keys would be sent to the API.
    DryRun { pending: usize },
    /// `failed` keys fell back to their source text.
    Translated { translated: usize, failed: usize, backup: PathBuf },
}

/// One catalog to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub language: Language,
    pub path: PathBuf,
    /// Named on the command line: a missing file is a failure, not a skip.
    pub required: bool,
}

impl Target {
    /// A catalog derived from the configured language table.
    pub fn planned(language: Language, path: PathBuf) -> Self {
        Self { language, path, required: false }
    }

    /// A catalog the user asked for by path.
    pub fn explicit(language: Language, path: PathBuf) -> Self {
        Self { language, path, required: true }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub files_written: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub translated: usize,
    pub fallbacks: usize,
    pub pending: usize,
}

impl Summary {
    /// Item fallbacks are not failures; only files that could not be processed are.
    pub fn is_success(&self) -> bool {
        self.files_failed == 0
    }

    fn record(&mut self, target: &Target, outcome: &Outcome) {
        match outcome {
            Outcome::Missing if target.required => self.files_failed += 1,
            Outcome::Missing | Outcome::NothingToDo => self.files_skipped += 1,
            Outcome::DryRun { pending } => self.pending += pending,
            Outcome::Translated { translated, failed, .. } => {
                self.files_written += 1;
                self.translated += translated;
                self.fallbacks += failed;
            }
        }
    }
}

/// Work out which catalogs to process.
///
/// Explicit files win over the configured table; their language is the name
/// of the directory holding them (`src/locales/it/translation.json` -> `it`).
/// The source language is never a target.
pub fn plan_targets(cfg: &AppConfig, only: &[String], files: &[PathBuf]) -> Vec<Target> {
    if files.is_empty() {
        for code in cfg.unknown_target_codes(only) {
            warn!(language = %code, "requested language is not a configured target");
        }
        return cfg
            .target_languages(only)
            .map(|language| Target::planned(language.clone(), cfg.catalog.path_for(&language.code)))
            .collect();
    }

    files
        .iter()
        .filter_map(|path| {
            let code = language_code_of(path)?;
            let language = Language::lookup(&cfg.languages, &code);
            if language.source {
                warn!(path = %path.display(), language = %language.code, "skipping source language catalog");
                return None;
            }
            if !only.is_empty() && !only.iter().any(|c| c.eq_ignore_ascii_case(&language.code)) {
                return None;
            }
            Some(Target::explicit(language, path.clone()))
        })
        .collect()
}

fn language_code_of(path: &Path) -> Option<String> {
    let code = path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned());
    if code.is_none() {
        warn!(path = %path.display(), "cannot infer language from path; expected <locale>/<file>.json");
    }
    code
}

/// Translate every untranslated key of one catalog and persist it.
pub async fn process_catalog(
    path: &Path,
    language: &Language,
    translator: &dyn Translator,
    opts: &JobOptions,
) -> Result<Outcome, ServiceError> {
    let mut store = match CatalogStore::load(path).await {
        Ok(store) => store,
        Err(ServiceError::NotFound(_)) => {
            error!(event = "catalog_missing", language = %language.code, path = %path.display(), "catalog file does not exist");
            return Ok(Outcome::Missing);
        }
        Err(e) => return Err(e),
    };

    let keys = store.untranslated_keys(&opts.marker);
    if keys.is_empty() {
        info!(event = "nothing_to_do", language = %language.code, "no {} untranslated strings found", language.name);
        return Ok(Outcome::NothingToDo);
    }

    if opts.dry_run {
        for key in &keys {
            info!(event = "pending", language = %language.code, %key, "would translate");
        }
        return Ok(Outcome::DryRun { pending: keys.len() });
    }

    info!(event = "translate_start", language = %language.code, path = %path.display(), count = keys.len(), "translating to {} {} untranslated strings", language.name, keys.len());

    let mut translated = 0;
    let mut failed = 0;
    for key in &keys {
        match translator.translate(key, language).await {
            Ok(text) => {
                store.set(key, format!("{}{}", opts.ai_tag, text));
                translated += 1;
            }
            Err(e) => {
                warn!(event = "translate_failed", language = %language.code, %key, error = %e, "keeping original text");
                store.set(key, key.clone());
                failed += 1;
            }
        }
    }

    let backup = store.persist_with_backup(&opts.backup_suffix, opts.indent).await?;
    info!(event = "translate_done", language = %language.code, translated, failed, backup = %backup.display(), "translation completed");

    Ok(Outcome::Translated { translated, failed, backup })
}

/// Process targets one after another; a broken file does not stop the batch.
pub async fn run(targets: &[Target], translator: &dyn Translator, opts: &JobOptions) -> Summary {
    let mut summary = Summary::default();
    for target in targets {
        match process_catalog(&target.path, &target.language, translator, opts).await {
            Ok(outcome) => summary.record(target, &outcome),
            Err(e) => {
                error!(event = "catalog_failed", language = %target.language.code, path = %target.path.display(), error = %e, "catalog not processed");
                summary.files_failed += 1;
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const MARKER: &str = "__STRING_NOT_TRANSLATED__";

    /// Uppercases the text; fails for keys containing "boom".
    #[derive(Default)]
    struct FakeTranslator {
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Translator for FakeTranslator {
        async fn translate(&self, text: &str, target: &Language) -> Result<String, ServiceError> {
            self.calls.lock().unwrap().push((text.to_string(), target.code.clone()));
            if text.contains("boom") {
                return Err(ServiceError::Translation("api returned 500".into()));
            }
            Ok(text.to_uppercase())
        }
    }

    fn opts(dry_run: bool) -> JobOptions {
        JobOptions::from_config(&CatalogConfig::default(), dry_run)
    }

    async fn catalog(lang: &str, body: &str) -> Result<PathBuf, anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("job_{}", uuid::Uuid::new_v4())).join(lang);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join("translation.json");
        tokio::fs::write(&path, body).await?;
        Ok(path)
    }

    async fn cleanup(path: &Path) {
        if let Some(root) = path.parent().and_then(|p| p.parent()) {
            let _ = tokio::fs::remove_dir_all(root).await;
        }
    }

    #[tokio::test]
    async fn markers_replaced_and_failures_fall_back() -> Result<(), anyhow::Error> {
        let path = catalog(
            "it",
            &format!(
                r#"{{"Save": "{MARKER}", "count": 3, "boom {{{{count}}}}": "{MARKER}", "flags": {{"a": true}}, "Done": "Fatto"}}"#
            ),
        )
        .await?;
        let translator = FakeTranslator::default();
        let italian = Language::new("Italian", "it");

        let outcome = process_catalog(&path, &italian, &translator, &opts(false)).await?;
        let backup = path.with_file_name("translation_untranslated.json");
        assert_eq!(outcome, Outcome::Translated { translated: 1, failed: 1, backup: backup.clone() });

        let written: serde_json::Value = serde_json::from_str(&tokio::fs::read_to_string(&path).await?)?;
        assert_eq!(written["Save"], "𐓙SAVE");
        assert_eq!(written["boom {{count}}"], "boom {{count}}");
        assert_eq!(written["Done"], "Fatto");
        assert_eq!(written["count"], 3);
        assert_eq!(written["flags"], serde_json::json!({"a": true}));
        let order: Vec<String> = written.as_object().map(|m| m.keys().cloned().collect()).unwrap_or_default();
        assert_eq!(order, vec!["Save", "count", "boom {{count}}", "flags", "Done"]);

        let original: serde_json::Value = serde_json::from_str(&tokio::fs::read_to_string(&backup).await?)?;
        assert_eq!(original["Save"], MARKER);

        let calls = translator.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("Save".into(), "it".into()), ("boom {{count}}".into(), "it".into())]);

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn nothing_to_do_leaves_file_alone() -> Result<(), anyhow::Error> {
        let body = r#"{"Save": "Salva"}"#;
        let path = catalog("it", body).await?;
        let translator = FakeTranslator::default();

        let outcome = process_catalog(&path, &Language::new("Italian", "it"), &translator, &opts(false)).await?;
        assert_eq!(outcome, Outcome::NothingToDo);
        assert_eq!(tokio::fs::read_to_string(&path).await?, body);
        assert!(!path.with_file_name("translation_untranslated.json").exists());
        assert!(translator.calls.lock().unwrap().is_empty());

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn dry_run_calls_nothing_and_writes_nothing() -> Result<(), anyhow::Error> {
        let body = format!(r#"{{"Save": "{MARKER}", "Open": "{MARKER}"}}"#);
        let path = catalog("fr", &body).await?;
        let translator = FakeTranslator::default();

        let outcome = process_catalog(&path, &Language::new("French", "fr"), &translator, &opts(true)).await?;
        assert_eq!(outcome, Outcome::DryRun { pending: 2 });
        assert_eq!(tokio::fs::read_to_string(&path).await?, body);
        assert!(translator.calls.lock().unwrap().is_empty());

        cleanup(&path).await;
        Ok(())
    }

    #[tokio::test]
    async fn run_continues_past_missing_and_broken_files() -> Result<(), anyhow::Error> {
        let good = catalog("it", &format!(r#"{{"Save": "{MARKER}"}}"#)).await?;
        let broken = catalog("fr", "[]").await?;
        let missing = good.with_file_name("nope.json");
        let targets = vec![
            Target::planned(Language::new("French", "fr"), broken.clone()),
            Target::planned(Language::new("Italian", "it"), missing),
            Target::planned(Language::new("Italian", "it"), good.clone()),
        ];

        let summary = run(&targets, &FakeTranslator::default(), &opts(false)).await;
        assert_eq!(
            summary,
            Summary { files_written: 1, files_skipped: 1, files_failed: 1, translated: 1, fallbacks: 0, pending: 0 }
        );
        assert!(!summary.is_success());

        cleanup(&good).await;
        cleanup(&broken).await;
        Ok(())
    }

    #[tokio::test]
    async fn missing_explicit_file_fails_the_run() -> Result<(), anyhow::Error> {
        let cfg = AppConfig::default();
        let missing = std::env::temp_dir()
            .join(format!("job_{}", uuid::Uuid::new_v4()))
            .join("it")
            .join("translation.json");

        let targets = plan_targets(&cfg, &[], &[missing]);
        assert!(targets[0].required);
        let summary = run(&targets, &FakeTranslator::default(), &opts(false)).await;
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.files_skipped, 0);
        assert!(!summary.is_success());

        let planned: Vec<_> = plan_targets(&cfg, &["it".to_string()], &[])
            .into_iter()
            .map(|t| Target { path: t.path.with_file_name("nope.json"), ..t })
            .collect();
        assert!(!planned[0].required);
        let summary = run(&planned, &FakeTranslator::default(), &opts(false)).await;
        assert_eq!(summary.files_skipped, 1);
        assert!(summary.is_success());
        Ok(())
    }

    #[test]
    fn plan_from_config_and_from_files() {
        let cfg = AppConfig::default();
        let planned = plan_targets(&cfg, &[], &[]);
        assert_eq!(
            planned.iter().map(|t| t.path.clone()).collect::<Vec<_>>(),
            vec![
                PathBuf::from("src/locales/it/translation.json"),
                PathBuf::from("src/locales/fr/translation.json"),
            ]
        );

        let files = vec![
            PathBuf::from("locales/en/translation.json"),
            PathBuf::from("locales/de/translation.json"),
            PathBuf::from("locales/fr/translation.json"),
        ];
        let planned = plan_targets(&cfg, &[], &files);
        let codes: Vec<_> = planned.iter().map(|t| (t.language.code.as_str(), t.language.name.as_str())).collect();
        assert_eq!(codes, vec![("de", "de"), ("fr", "French")]);

        let only = vec!["fr".to_string()];
        assert_eq!(plan_targets(&cfg, &only, &files).len(), 1);
        assert_eq!(plan_targets(&cfg, &only, &[]).len(), 1);
        assert!(plan_targets(&cfg, &["de".to_string()], &[]).is_empty());
    }
}
