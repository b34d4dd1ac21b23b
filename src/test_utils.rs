//! Shared test utilities for elm-lens.
//!
//! This module provides a small standard-library corpus and a scripted
//! inference tool. It is only compiled when running tests.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use crate::{
    corpus::{Corpus, RawAlias, RawConstructor, RawDatatype, RawModule, RawValue},
    error::ToolError,
    indexer::InferenceTool,
};

fn values(raws: &[&str]) -> Vec<RawValue> {
    raws.iter()
        .map(|raw| RawValue {
            raw: raw.to_string(),
        })
        .collect()
}

fn constructors(names: &[&str]) -> Vec<RawConstructor> {
    names
        .iter()
        .map(|name| RawConstructor {
            name: name.to_string(),
        })
        .collect()
}

pub fn basics_raw() -> RawModule {
    RawModule {
        name: "Basics".to_string(),
        document: "Tons of useful functions.\n\nThe following modules are imported by default: List,\nMaybe.\n\n# Equality".to_string(),
        values: values(&[
            "toString : a -> String",
            "max : comparable -> comparable -> comparable",
            "(+) : number -> number -> number",
        ]),
        datatypes: vec![RawDatatype {
            name: "Order".to_string(),
            constructors: constructors(&["LT", "EQ", "GT"]),
            raw: None,
        }],
        aliases: vec![],
    }
}

pub fn dict_raw() -> RawModule {
    RawModule {
        name: "Dict".to_string(),
        document: "A dictionary mapping unique keys to values.".to_string(),
        values: values(&[
            "map : (a -> b) -> Dict a -> Dict b",
            "empty : Dict k v",
            "insert : comparable -> v -> Dict comparable v -> Dict comparable v",
        ]),
        datatypes: vec![RawDatatype {
            name: "Dict".to_string(),
            constructors: vec![],
            raw: None,
        }],
        aliases: vec![],
    }
}

/// `Basics`, `List`, `Maybe`, `Dict` and `Graphics.Input`; the prelude is `List, Maybe`.
pub fn stdlib_raw_modules() -> Vec<RawModule> {
    vec![
        basics_raw(),
        RawModule {
            name: "List".to_string(),
            document: "A list of values.".to_string(),
            values: values(&[
                "map : (a -> b) -> List a -> List b",
                "foldl : (a -> b -> b) -> b -> List a -> b",
                "member : a -> List a -> Bool",
            ]),
            ..Default::default()
        },
        RawModule {
            name: "Maybe".to_string(),
            document: "Optional values.".to_string(),
            values: values(&[
                "withDefault : a -> Maybe a -> a",
                "map : (a -> b) -> Maybe a -> Maybe b",
            ]),
            datatypes: vec![RawDatatype {
                name: "Maybe".to_string(),
                constructors: constructors(&["Just", "Nothing"]),
                raw: Some("data Maybe a = Just a | Nothing".to_string()),
            }],
            aliases: vec![],
        },
        dict_raw(),
        RawModule {
            name: "Graphics.Input".to_string(),
            document: "Interactive elements.".to_string(),
            values: values(&["button : msg -> String -> Element"]),
            datatypes: vec![],
            aliases: vec![RawAlias {
                name: "Handle".to_string(),
                raw: "type Handle a = Input a".to_string(),
            }],
        },
    ]
}

pub fn stdlib_corpus() -> Corpus {
    Corpus::from_raw_modules(stdlib_raw_modules()).expect("fixture corpus has a Basics module")
}

/// Serialize `modules` as a corpus file `dir/name` and return its path.
pub fn write_corpus(dir: &Path, name: &str, modules: &[RawModule]) -> PathBuf {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(modules).expect("fixture serializes");
    fs::write(&path, json).expect("Failed to write corpus file");
    path
}

/// Inference tool that replays canned outputs and counts its runs.
pub struct ScriptedTool {
    outputs: Mutex<Vec<Result<String, String>>>,
    delay: Duration,
    pub runs: AtomicUsize,
}

impl ScriptedTool {
    /// Each run pops the next output; the last one repeats.
    pub fn new(outputs: Vec<Result<&str, &str>>) -> ScriptedTool {
        ScriptedTool {
            outputs: Mutex::new(
                outputs
                    .into_iter()
                    .rev()
                    .map(|output| output.map(String::from).map_err(String::from))
                    .collect(),
            ),
            delay: Duration::ZERO,
            runs: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> ScriptedTool {
        self.delay = delay;
        self
    }

    pub fn run_count(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl InferenceTool for ScriptedTool {
    fn name(&self) -> &str {
        "scripted"
    }

    fn run(&self, _file: &Path) -> Result<String, ToolError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);

        let mut outputs = self.outputs.lock().expect("scripted outputs lock");
        let next = if outputs.len() > 1 {
            outputs.pop()
        } else {
            outputs.last().cloned()
        };

        match next {
            Some(Ok(stdout)) => Ok(stdout),
            Some(Err(_)) | None => Err(ToolError::EmptyOutput {
                program: "scripted".to_string(),
            }),
        }
    }
}

pub const DICT_ORACLE_OUTPUT: &str = r#"[
  {"name":"map","fullName":"Dict.map","signature":"(comparable -> a -> b) -> Dict comparable a -> Dict comparable b","comment":"Apply a function to all values.","href":"http://package.elm-lang.org/packages/elm-lang/core/latest/Dict#map"},
  {"name":"map","fullName":"List.map","signature":"(a -> b) -> List a -> List b","comment":"Apply a function to every element.","href":"http://package.elm-lang.org/packages/elm-lang/core/latest/List#map"},
  {"name":"filter","fullName":"List.filter","signature":"(a -> Bool) -> List a -> List a","comment":"","href":""},
  {"name":"foldl","fullName":"List.foldl","signature":"(a -> b -> b) -> b -> List a -> b","comment":"","href":""}
]"#;
