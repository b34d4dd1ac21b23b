use std::path::{Path, PathBuf};

use anyhow::anyhow;
use config::{Config, File};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Type-at-cursor resolution on/off
    pub enabled: bool,
    /// Declaration corpus files, merged in order; relative paths are taken from the project root
    pub docs_paths: Vec<String>,
    pub oracle_command: String,
    pub indexer_workers: usize,
    pub lookup_retries: u32,
    pub lookup_retry_delay_ms: u64,
    pub completion_limit: usize,
    pub hover: bool,
    pub check_on_save: bool,
    pub make_command: String,
}

impl Settings {
    pub fn new(root_dir: &Path) -> anyhow::Result<Settings> {
        let expanded = shellexpand::tilde("~/.config/elm-lens/settings");
        let settings = Config::builder()
            .add_source(File::with_name(&expanded).required(false))
            .add_source(
                File::with_name(&format!(
                    "{}/.elm-lens",
                    root_dir
                        .to_str()
                        .ok_or(anyhow!("Can't convert root_dir to str"))?
                ))
                .required(false),
            )
            .set_default("enabled", true)?
            .set_default("docs_paths", vec!["docs.json"])?
            .set_default("oracle_command", "elm-oracle")?
            .set_default("indexer_workers", 2)?
            .set_default("lookup_retries", 10)?
            .set_default("lookup_retry_delay_ms", 100)?
            .set_default("completion_limit", 50)?
            .set_default("hover", true)?
            .set_default("check_on_save", false)?
            .set_default("make_command", "elm-make")?
            .build()
            .map_err(|err| anyhow!("Build err: {err}"))?;

        let settings = settings.try_deserialize::<Settings>()?;

        anyhow::Ok(settings)
    }

    /// `docs_paths` with `~` expanded and relative entries joined onto `root_dir`.
    pub fn corpus_paths(&self, root_dir: &Path) -> Vec<PathBuf> {
        self.docs_paths
            .iter()
            .map(|path| PathBuf::from(shellexpand::tilde(path).as_ref()))
            .map(|path| match path.is_absolute() {
                true => path,
                false => root_dir.join(path),
            })
            .collect()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            enabled: true,
            docs_paths: vec!["docs.json".to_string()],
            oracle_command: "elm-oracle".to_string(),
            indexer_workers: 2,
            lookup_retries: 10,
            lookup_retry_delay_ms: 100,
            completion_limit: 50,
            hover: true,
            check_on_save: false,
            make_command: "elm-make".to_string(),
        }
    }
}
