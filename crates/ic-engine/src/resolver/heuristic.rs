//! Heuristic stage: enthusiast shorthand → canonical vehicle facts.
//!
//! Consulted only after both database stages miss. Each rule is a regex
//! over the normalized query; the first participating capture group picks
//! the generation. A hit is written back to the pattern store so the same
//! query resolves as an exact match next time.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

use ic_protocol::{Confidence, Pattern, VehicleRecord, YearRange};

use super::{Resolution, Resolver, Stage};
use crate::classifier::Identifier;
use crate::context::LookupContext;
use crate::error::EngineResult;
use crate::normalize::year_hint;
use crate::store::Store;

pub const HEURISTIC_SOURCE: &str = "Heuristic Pattern Engine";

struct Generation {
    /// Normalized capture values selecting this generation; `""` when the
    /// rule matched without a generation group.
    keys: &'static [&'static str],
    chassis: Option<&'static str>,
    start: i32,
    end: i32,
    engine: Option<&'static str>,
}

struct Rule {
    name: &'static str,
    pattern: &'static str,
    make: &'static str,
    model: &'static str,
    confidence: u8,
    generations: &'static [Generation],
}

const SKYLINE_GENERATIONS: &[Generation] = &[
    Generation {
        keys: &["32", "bnr32"],
        chassis: Some("BNR32"),
        start: 1989,
        end: 1994,
        engine: Some("RB26DETT"),
    },
    Generation {
        keys: &["33", "bcnr33"],
        chassis: Some("BCNR33"),
        start: 1995,
        end: 1998,
        engine: Some("RB26DETT"),
    },
    Generation {
        keys: &["34", "bnr34"],
        chassis: Some("BNR34"),
        start: 1999,
        end: 2002,
        engine: Some("RB26DETT"),
    },
];

const RULES: &[Rule] = &[
    Rule {
        name: "skyline-gtr",
        pattern: r"\b(?:r(3[234])\s*(?:skyline\s*)?gt-?r|skyline\s*r(3[234])\s*gt-?r|(?:skyline\s*)?gt-?r\s*r(3[234])|(bnr32|bcnr33|bnr34))\b",
        make: "Nissan",
        model: "Skyline GT-R",
        confidence: 92,
        generations: SKYLINE_GENERATIONS,
    },
    Rule {
        name: "skyline",
        pattern: r"\b(?:r(3[234])\s*skyline|skyline\s*r(3[234]))\b",
        make: "Nissan",
        model: "Skyline GT-R",
        confidence: 85,
        generations: SKYLINE_GENERATIONS,
    },
    Rule {
        name: "supra",
        pattern: r"\b(?:(mk\s*iv|mk\s*4|mk\s*iii|mk\s*3|a80|a70)\s*supra|supra\s*(mk\s*iv|mk\s*4|mk\s*iii|mk\s*3|a80|a70)|(jza80|ma70))\b",
        make: "Toyota",
        model: "Supra",
        confidence: 90,
        generations: &[
            Generation {
                keys: &["mkiv", "mk4", "a80", "jza80"],
                chassis: Some("JZA80"),
                start: 1993,
                end: 2002,
                engine: Some("2JZ-GTE"),
            },
            Generation {
                keys: &["mkiii", "mk3", "a70", "ma70"],
                chassis: Some("MA70"),
                start: 1986,
                end: 1993,
                engine: Some("7M-GTE"),
            },
        ],
    },
    Rule {
        name: "rx7",
        pattern: r"\b(?:(fd|fc)\s*rx-?7|rx-?7\s*(fd|fc)|(fd3s|fc3s))\b",
        make: "Mazda",
        model: "RX-7",
        confidence: 90,
        generations: &[
            Generation {
                keys: &["fd", "fd3s"],
                chassis: Some("FD3S"),
                start: 1992,
                end: 2002,
                engine: Some("13B-REW"),
            },
            Generation {
                keys: &["fc", "fc3s"],
                chassis: Some("FC3S"),
                start: 1985,
                end: 1992,
                engine: Some("13B-T"),
            },
        ],
    },
    Rule {
        name: "nsx",
        pattern: r"\b(?:(?:honda\s*|acura\s*)?nsx(?:\s*(na1|na2))?|(na1|na2)(?:\s*nsx)?)\b",
        make: "Honda",
        model: "NSX",
        confidence: 88,
        generations: &[
            Generation {
                keys: &["na1"],
                chassis: Some("NA1"),
                start: 1990,
                end: 1997,
                engine: Some("C30A"),
            },
            Generation {
                keys: &["na2"],
                chassis: Some("NA2"),
                start: 1997,
                end: 2005,
                engine: Some("C32B"),
            },
            Generation {
                keys: &[""],
                chassis: None,
                start: 1990,
                end: 2005,
                engine: None,
            },
        ],
    },
    Rule {
        name: "integra-type-r",
        pattern: r"\b(?:integra\s*type\s*-?\s*r|itr|(dc2))\b",
        make: "Honda",
        model: "Integra Type R",
        confidence: 88,
        generations: &[Generation {
            keys: &["", "dc2"],
            chassis: Some("DC2"),
            start: 1995,
            end: 2001,
            engine: Some("B18C"),
        }],
    },
    Rule {
        name: "lancer-evo",
        pattern: r"\b(?:(?:lancer\s*)?evo(?:lution)?\s*(iv|v|vi|vii|viii|ix|4|5|6|7|8|9)|(cn9a|cp9a|ct9a))\b",
        make: "Mitsubishi",
        model: "Lancer Evolution",
        confidence: 88,
        generations: &[
            Generation {
                keys: &["iv", "4", "cn9a"],
                chassis: Some("CN9A"),
                start: 1996,
                end: 1998,
                engine: Some("4G63T"),
            },
            Generation {
                keys: &["v", "vi", "5", "6", "cp9a"],
                chassis: Some("CP9A"),
                start: 1998,
                end: 2001,
                engine: Some("4G63T"),
            },
            Generation {
                keys: &["vii", "viii", "ix", "7", "8", "9", "ct9a"],
                chassis: Some("CT9A"),
                start: 2001,
                end: 2007,
                engine: Some("4G63T"),
            },
        ],
    },
    Rule {
        name: "silvia",
        pattern: r"\b(?:silvia\s*)?(s1[345])(?:\s*silvia)?\b",
        make: "Nissan",
        model: "Silvia",
        confidence: 87,
        generations: &[
            Generation {
                keys: &["s13"],
                chassis: Some("S13"),
                start: 1988,
                end: 1994,
                engine: Some("SR20DET"),
            },
            Generation {
                keys: &["s14"],
                chassis: Some("S14"),
                start: 1993,
                end: 1998,
                engine: Some("SR20DET"),
            },
            Generation {
                keys: &["s15"],
                chassis: Some("S15"),
                start: 1999,
                end: 2002,
                engine: Some("SR20DET"),
            },
        ],
    },
    Rule {
        name: "impreza-sti",
        pattern: r"\b(?:(?:subaru\s*)?impreza\s*(?:wrx\s*)?(?:sti\s*)?(gc8|22b)|(gc8|22b))\b",
        make: "Subaru",
        model: "Impreza WRX STI",
        confidence: 86,
        generations: &[
            Generation {
                keys: &["gc8"],
                chassis: Some("GC8"),
                start: 1992,
                end: 2000,
                engine: Some("EJ20"),
            },
            Generation {
                keys: &["22b"],
                chassis: Some("GC8"),
                start: 1998,
                end: 1998,
                engine: Some("EJ22"),
            },
        ],
    },
    Rule {
        name: "ae86",
        pattern: r"\b(?:ae86|hachi\s*roku|(?:corolla\s*)?(?:levin|trueno))\b",
        make: "Toyota",
        model: "Corolla AE86",
        confidence: 90,
        generations: &[Generation {
            keys: &[""],
            chassis: Some("AE86"),
            start: 1983,
            end: 1987,
            engine: Some("4A-GE"),
        }],
    },
    Rule {
        name: "chaser",
        pattern: r"\b(?:jzx100|chaser(?:\s*tourer\s*v)?)\b",
        make: "Toyota",
        model: "Chaser",
        confidence: 86,
        generations: &[Generation {
            keys: &[""],
            chassis: Some("JZX100"),
            start: 1996,
            end: 2001,
            engine: Some("1JZ-GTE"),
        }],
    },
];

static COMPILED: LazyLock<Vec<(Regex, &'static Rule)>> = LazyLock::new(|| {
    RULES
        .iter()
        .filter_map(|rule| match Regex::new(rule.pattern) {
            Ok(re) => Some((re, rule)),
            Err(e) => {
                tracing::error!(rule = rule.name, error = %e, "heuristic rule failed to compile");
                None
            }
        })
        .collect()
});

/// A rule hit, before it becomes a record or a learned pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicHit {
    pub rule: &'static str,
    pub make: &'static str,
    pub model: &'static str,
    pub chassis_code: Option<&'static str>,
    pub years: YearRange,
    pub engine_code: Option<&'static str>,
    pub confidence: Confidence,
}

impl HeuristicHit {
    pub fn to_record(&self, at: DateTime<Utc>) -> VehicleRecord {
        VehicleRecord {
            make: self.make.to_string(),
            model: self.model.to_string(),
            year: self.years.is_single().then_some(self.years.start),
            year_range: Some(self.years),
            chassis_code: self.chassis_code.map(String::from),
            engine_code: self.engine_code.map(String::from),
            body_type: None,
            confidence: self.confidence,
            source: HEURISTIC_SOURCE.to_string(),
            source_url: None,
            last_verified: at,
        }
    }

    /// Learned pattern carrying the same canonical fields and confidence.
    pub fn to_pattern(&self, search_pattern: &str, at: DateTime<Utc>) -> Pattern {
        Pattern {
            id: Uuid::now_v7(),
            search_pattern: search_pattern.to_string(),
            make: self.make.to_string(),
            model: self.model.to_string(),
            chassis_code: self.chassis_code.map(String::from),
            year_range: Some(self.years),
            engine_pattern: self.engine_code.map(String::from),
            confidence: self.confidence,
            source: HEURISTIC_SOURCE.to_string(),
            auto_learned: true,
            created_at: at,
        }
    }
}

/// First rule matching `text` (normalized, lowercase), if any.
pub fn match_rules(text: &str) -> Option<HeuristicHit> {
    COMPILED.iter().find_map(|(re, rule)| {
        let caps = re.captures(text)?;
        let key: String = caps
            .iter()
            .skip(1)
            .flatten()
            .next()
            .map(|m| m.as_str().chars().filter(|c| !c.is_whitespace() && *c != '-').collect())
            .unwrap_or_default();
        let generation = rule.generations.iter().find(|g| g.keys.contains(&key.as_str()))?;

        let full = YearRange::new(generation.start, generation.end).ok()?;
        let years = match year_hint(text) {
            Some(year) if full.contains(year) => YearRange::single(year),
            _ => full,
        };

        Some(HeuristicHit {
            rule: rule.name,
            make: rule.make,
            model: rule.model,
            chassis_code: generation.chassis,
            years,
            engine_code: generation.engine,
            confidence: Confidence::new(rule.confidence.into()),
        })
    })
}

pub struct HeuristicResolver {
    store: Arc<dyn Store>,
}

impl HeuristicResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Persist a hit as a learned pattern. Failures are logged and dropped;
    /// a conflict means another lookup learned it first.
    async fn learn(&self, ctx: &LookupContext, key: &str, hit: &HeuristicHit) {
        let pattern = hit.to_pattern(key, Utc::now());
        match ctx.guard(self.store.upsert_pattern(&pattern)).await {
            Ok(true) => tracing::info!(pattern = key, rule = hit.rule, "learned heuristic pattern"),
            Ok(false) => tracing::debug!(pattern = key, "heuristic pattern already learned"),
            Err(e) => tracing::warn!(pattern = key, error = %e, "failed to persist learned pattern"),
        }
    }
}

#[async_trait]
impl Resolver for HeuristicResolver {
    async fn resolve(
        &self,
        ctx: &LookupContext,
        id: &Identifier,
    ) -> EngineResult<Option<Resolution>> {
        if matches!(id, Identifier::Vin(_)) {
            return Ok(None);
        }
        let key = id.pattern_key();
        let Some(hit) = match_rules(&key) else {
            return Ok(None);
        };

        self.learn(ctx, &key, &hit).await;

        Ok(Some(Resolution {
            record: hit.to_record(Utc::now()),
            stage: Stage::Heuristic,
            stored_confidence: hit.confidence,
            detail: format!("\"{key}\" matched the {} naming rule", hit.rule),
        }))
    }

    fn stage(&self) -> Stage {
        Stage::Heuristic
    }
}
