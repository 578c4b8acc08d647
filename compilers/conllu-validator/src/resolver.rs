use std::collections::HashMap;
use std::sync::Arc;

use conllu_protocol::{LanguageDataProvider, Misc};
use tracing::info;

use crate::ruleset::LanguageRuleset;

/// Ruleset chosen for one token.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub ruleset: Arc<LanguageRuleset>,
    /// True when a `Lang=` attribute switched away from the primary language.
    pub switched: bool,
}

impl Resolved {
    pub fn lang(&self) -> &str {
        self.ruleset.code()
    }
}

/// Hands out the primary ruleset, or a lazily loaded one for code-switched tokens.
pub struct RulesetResolver {
    provider: Box<dyn LanguageDataProvider>,
    primary: Arc<LanguageRuleset>,
    secondary: HashMap<String, Arc<LanguageRuleset>>,
}

impl RulesetResolver {
    pub fn new(provider: Box<dyn LanguageDataProvider>, lang: &str) -> Self {
        let primary = Arc::new(LanguageRuleset::new(lang, provider.language(lang)));
        Self {
            provider,
            primary,
            secondary: HashMap::new(),
        }
    }

    pub fn primary(&self) -> &Arc<LanguageRuleset> {
        &self.primary
    }

    pub fn resolve(&mut self, misc: Misc<'_>) -> Resolved {
        let Some(lang) = misc.lang().filter(|l| *l != self.primary.code()) else {
            return Resolved {
                ruleset: Arc::clone(&self.primary),
                switched: false,
            };
        };
        let ruleset = match self.secondary.get(lang) {
            Some(ruleset) => Arc::clone(ruleset),
            None => {
                info!(lang, "resolving code-switched ruleset");
                let ruleset = Arc::new(LanguageRuleset::new(lang, self.provider.language(lang)));
                self.secondary.insert(lang.to_string(), Arc::clone(&ruleset));
                ruleset
            }
        };
        Resolved {
            ruleset,
            switched: true,
        }
    }
}
