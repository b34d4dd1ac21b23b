//! Resolution of a (possibly qualified) token against a [`Scope`].
//!
//! Four strategies run in a fixed order and the first one that produces any
//! output wins:
//!
//! 1. [`Strategy::Open`]: the whole token in every open module
//! 2. [`Strategy::Qualified`]: the last segment in the module named by the qualifier
//! 3. [`Strategy::Aliased`]: the last segment in modules aliased as the qualifier
//! 4. [`Strategy::Selective`]: the whole token in modules that expose it by name
//!
//! Within one module a value beats a datatype, which beats an alias, which
//! beats the module's own name. Matches from several modules are all
//! reported, joined by `"; "`; the caller decides how to show an ambiguity.

use crate::{corpus::Module, scope::Scope};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Open,
    Qualified,
    Aliased,
    Selective,
}

/// A token split on its last `.`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifiedToken<'a> {
    pub full: &'a str,
    pub qualifier: Option<&'a str>,
    pub name: &'a str,
}

impl<'a> QualifiedToken<'a> {
    pub fn parse(token: &'a str) -> QualifiedToken<'a> {
        match token.rsplit_once('.') {
            Some((qualifier, name)) if !qualifier.is_empty() => QualifiedToken {
                full: token,
                qualifier: Some(qualifier),
                name,
            },
            _ => QualifiedToken {
                full: token,
                qualifier: None,
                name: token,
            },
        }
    }
}

/// Render the highest-priority match for `key` inside `module`.
pub fn match_module(module: &Module, key: &str) -> Option<String> {
    if let Some(signature) = module.signature_of(key) {
        return Some(format!("{}.{} : {}", module.name, key, signature));
    }
    if let Some(datatype) = module.datatype(key) {
        return Some(format!(
            "data {}.{} = {}",
            module.name,
            datatype.display_name(),
            datatype.signature
        ));
    }
    if let Some(alias) = module.alias(key) {
        return Some(format!("type {}.{} = {}", module.name, key, alias.signature));
    }
    if key == module.name {
        return Some(format!("Module {}", module.name));
    }
    None
}

fn search<'m>(key: &str, modules: impl Iterator<Item = &'m Module>) -> String {
    modules
        .filter_map(|module| match_module(module, key))
        .collect::<Vec<_>>()
        .join("; ")
}

pub struct Resolver<'a> {
    scope: &'a Scope,
    modules: &'a [Module],
}

impl<'a> Resolver<'a> {
    pub fn new(scope: &'a Scope, modules: &'a [Module]) -> Resolver<'a> {
        Resolver { scope, modules }
    }

    /// The formatted signature(s) for `token`, or an empty string.
    pub fn resolve(&self, token: &str) -> String {
        self.resolve_with_strategy(token)
            .map(|(_, rendered)| rendered)
            .unwrap_or_default()
    }

    /// Like [`Resolver::resolve`], also reporting which strategy matched.
    pub fn resolve_with_strategy(&self, token: &str) -> Option<(Strategy, String)> {
        if token.is_empty() {
            return None;
        }
        let token = QualifiedToken::parse(token);

        [
            Strategy::Open,
            Strategy::Qualified,
            Strategy::Aliased,
            Strategy::Selective,
        ]
        .into_iter()
        .map(|strategy| (strategy, self.run(strategy, &token)))
        .find(|(_, rendered)| !rendered.is_empty())
    }

    fn run(&self, strategy: Strategy, token: &QualifiedToken) -> String {
        let modules = self.modules.iter();
        let scope = self.scope;

        match (strategy, token.qualifier) {
            (Strategy::Open, _) => search(
                token.full,
                modules.filter(|module| scope.is_open(&module.name)),
            ),

            (Strategy::Qualified, Some(qualifier)) => search(
                token.name,
                modules.filter(|module| module.name == qualifier && scope.is_qualified(&module.name)),
            ),
            (Strategy::Aliased, Some(qualifier)) => search(
                token.name,
                modules.filter(|module| scope.has_alias(&module.name, qualifier)),
            ),
            // both need a qualifier to look in
            (Strategy::Qualified | Strategy::Aliased, None) => String::new(),

            (Strategy::Selective, _) => search(
                token.full,
                modules.filter(|module| scope.exposes(&module.name, token.full)),
            ),
        }
    }
}

/// Resolve `token` against `scope` and `modules` in one call.
pub fn resolve(token: &str, scope: &Scope, modules: &[Module]) -> String {
    Resolver::new(scope, modules).resolve(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        corpus::{Corpus, RawModule, RawValue},
        scope::{Scope, ScopeEntry},
        test_utils::stdlib_corpus,
    };

    fn scope_for(imports: &[&str], corpus: &Corpus) -> Scope {
        Scope::build(imports.iter(), corpus.prelude(), None)
    }

    #[test]
    fn test_split_token() {
        assert_eq!(
            QualifiedToken::parse("Graphics.Input.button"),
            QualifiedToken {
                full: "Graphics.Input.button",
                qualifier: Some("Graphics.Input"),
                name: "button",
            }
        );
        assert_eq!(QualifiedToken::parse("map").qualifier, None);
        assert_eq!(QualifiedToken::parse(".map").qualifier, None);
    }

    #[test]
    fn test_qualified_value() {
        let corpus = stdlib_corpus();
        let mut scope = Scope::default();
        scope.insert("Dict".to_string(), ScopeEntry::qualified());

        assert_eq!(
            resolve("Dict.map", &scope, corpus.modules()),
            "Dict.map : (a -> b) -> Dict a -> Dict b"
        );
    }

    #[test]
    fn test_ambiguous_open_modules_report_all_matches() {
        let corpus = stdlib_corpus();
        let scope = scope_for(&[], &corpus);

        assert_eq!(
            resolve("map", &scope, corpus.modules()),
            "List.map : (a -> b) -> List a -> List b; Maybe.map : (a -> b) -> Maybe a -> Maybe b"
        );
    }

    #[test]
    fn test_aliased_lookup() {
        let corpus = stdlib_corpus();
        let scope = scope_for(&["Dict as D"], &corpus);
        let resolver = Resolver::new(&scope, corpus.modules());

        assert_eq!(
            resolver.resolve_with_strategy("D.map"),
            Some((
                Strategy::Aliased,
                "Dict.map : (a -> b) -> Dict a -> Dict b".to_string()
            ))
        );
        // the alias replaces the qualified name
        assert_eq!(resolver.resolve("Dict.map"), "");
        assert_eq!(resolver.resolve("D"), "");
    }

    #[test]
    fn test_selective_lookup() {
        let corpus = stdlib_corpus();
        let scope = scope_for(&["Dict (empty)"], &corpus);
        let resolver = Resolver::new(&scope, corpus.modules());

        assert_eq!(
            resolver.resolve_with_strategy("empty"),
            Some((Strategy::Selective, "Dict.empty : Dict k v".to_string()))
        );
        assert_eq!(resolver.resolve("insert"), "");
    }

    #[test]
    fn test_datatype_alias_and_module_rendering() {
        let corpus = stdlib_corpus();
        let scope = scope_for(&["Dict", "open Graphics.Input", "Graphics.Input"], &corpus);
        let resolver = Resolver::new(&scope, corpus.modules());

        assert_eq!(resolver.resolve("Maybe"), "data Maybe.Maybe a = Just a | Nothing");
        assert_eq!(resolver.resolve("Order"), "data Basics.Order = LT | EQ | GT");
        assert_eq!(resolver.resolve("Handle"), "type Graphics.Input.Handle = Input a");
        assert_eq!(resolver.resolve("Graphics.Input"), "Module Graphics.Input");
        assert_eq!(resolver.resolve("Dict.Dict"), "data Dict.Dict = ");
        assert_eq!(
            resolver.resolve("Graphics.Input.button"),
            "Graphics.Input.button : msg -> String -> Element"
        );
    }

    #[test]
    fn test_bare_tokens_skip_qualified_and_aliased_lookup() {
        let corpus = stdlib_corpus();
        let scope = scope_for(&["Dict", "Maybe as M"], &corpus);
        let resolver = Resolver::new(&scope, corpus.modules());

        assert_eq!(resolver.resolve_with_strategy("Dict"), None);
        assert_eq!(resolver.resolve_with_strategy("M"), None);
        assert_eq!(
            resolver.resolve_with_strategy("Dict.Dict"),
            Some((Strategy::Qualified, "data Dict.Dict = ".to_string()))
        );
    }

    #[test]
    fn test_value_beats_module_name_within_a_module() {
        let corpus = Corpus::from_raw_modules(vec![
            crate::test_utils::basics_raw(),
            RawModule {
                name: "Shadow".to_string(),
                values: vec![RawValue {
                    raw: "Shadow : Int".to_string(),
                }],
                ..Default::default()
            },
        ])
        .unwrap();
        let scope = scope_for(&["open Shadow"], &corpus);
        assert_eq!(resolve("Shadow", &scope, corpus.modules()), "Shadow.Shadow : Int");
    }

    #[test]
    fn test_open_beats_qualified() {
        let corpus = stdlib_corpus();
        let scope = scope_for(&["open Dict", "Dict"], &corpus);
        let resolver = Resolver::new(&scope, corpus.modules());
        // the datatype outranks the module's own name
        assert_eq!(
            resolver.resolve_with_strategy("Dict"),
            Some((Strategy::Open, "data Dict.Dict = ".to_string()))
        );
    }

    #[test]
    fn test_qualified_beats_aliased_when_names_collide() {
        let corpus = Corpus::from_raw_modules(vec![
            crate::test_utils::basics_raw(),
            RawModule {
                name: "D".to_string(),
                values: vec![RawValue {
                    raw: "map : D -> D".to_string(),
                }],
                ..Default::default()
            },
            crate::test_utils::dict_raw(),
        ])
        .unwrap();
        let scope = scope_for(&["D", "Dict as D"], &corpus);
        let resolver = Resolver::new(&scope, corpus.modules());

        assert_eq!(
            resolver.resolve_with_strategy("D.map"),
            Some((Strategy::Qualified, "D.map : D -> D".to_string()))
        );
    }

    #[test]
    fn test_unresolvable_tokens_are_silent() {
        let corpus = stdlib_corpus();
        let scope = scope_for(&[], &corpus);
        let resolver = Resolver::new(&scope, corpus.modules());
        assert_eq!(resolver.resolve("localBinding"), "");
        assert_eq!(resolver.resolve("Nope.map"), "");
        assert_eq!(resolver.resolve(""), "");
        assert_eq!(resolver.resolve_with_strategy("42"), None);
    }
}
