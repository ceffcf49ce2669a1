//! The Smart Parser: public operations over an injected store.
//!
//! Every operation returns a [`Response`]; internal errors are converted at
//! this boundary into confidence-0 system-error responses. Each lookup is
//! queued for audit before it returns.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::Serialize;
use uuid::Uuid;

use ic_protocol::{
    ComplianceResult, Confidence, LookupType, MarketSummary, NextStep, Outcome, Pattern,
    PatternSuggestion, Priority, Response, ShippingEstimate, VehicleRecord, WatchlistEntry,
    WatchlistRequest, YearRange,
};

use crate::audit::AuditLogger;
use crate::classifier::{Identifier, classify, validate_vin};
use crate::config::EngineConfig;
use crate::context::LookupContext;
use crate::error::{EngineError, EngineResult};
use crate::gap::GapReporter;
use crate::ledger::SourceLedger;
use crate::market::{format_minor, market_confidence, summarize};
use crate::normalize::{canonical_country, canonical_make, normalize_query};
use crate::resolver::{FallbackChain, Resolution, Stage};
use crate::risk::{self, DEFAULT_AGE_THRESHOLD, RiskInput};
use crate::scorer::ConfidenceScorer;
use crate::store::{MemoryStore, PatternQuery, PgStore, Store};

/// Confidence assigned to user-contributed patterns.
pub const CONTRIBUTED_CONFIDENCE: u8 = 70;
pub const CONTRIBUTED_SOURCE: &str = "User Contribution";

/// Earliest model year accepted by compliance checks.
pub const EARLIEST_MODEL_YEAR: i32 = 1886;

const REGULATION_DISCLAIMER: &str = "Import rules change; confirm with the destination's \
    transport authority or a licensed broker before purchase.";

pub struct SmartParser {
    store: Arc<dyn Store>,
    config: EngineConfig,
    chain: FallbackChain,
    scorer: ConfidenceScorer,
    gaps: GapReporter,
    audit: AuditLogger,
}

impl SmartParser {
    /// Build an engine over `store`. Spawns the audit writer, so this must
    /// run inside a Tokio runtime.
    pub fn new(store: Arc<dyn Store>, config: EngineConfig) -> Self {
        let scorer = ConfidenceScorer::from_config(&config);
        let chain = FallbackChain::standard(store.clone(), scorer);
        let gaps = GapReporter::from_config(&config);
        let audit = AuditLogger::spawn(
            store.clone(),
            config.audit_queue_capacity,
            config.review_threshold,
        );
        Self {
            store,
            config,
            chain,
            scorer,
            gaps,
            audit,
        }
    }

    /// PostgreSQL when `database_url` is set, otherwise an empty in-memory store.
    pub async fn connect(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let store: Arc<dyn Store> = match &config.database_url {
            Some(url) => Arc::new(PgStore::connect(url, config.max_connections).await?),
            None => {
                tracing::warn!("no database URL configured, using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };
        Ok(Self::new(store, config))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    // ── Identity resolution ─────────────────────────────────────

    /// Resolve a VIN, chassis code, or free-text query.
    pub async fn resolve_identifier(
        &self,
        ctx: &LookupContext,
        raw: &str,
    ) -> Response<VehicleRecord> {
        let trimmed = raw.trim();
        let id = classify(trimmed);
        let response = if trimmed.chars().count() < self.config.min_identifier_len {
            self.gaps.invalid_input(&format!(
                "an identifier needs at least {} characters",
                self.config.min_identifier_len
            ))
        } else {
            let result = self.resolve(ctx, &id).await;
            self.settle(result, "resolve_identifier")
        };
        self.audit.record(ctx, trimmed, id.lookup_type(), &response);
        response
    }

    /// Decode a full VIN, or an 11–16 character WMI+VDS prefix.
    pub async fn decode_vin(&self, ctx: &LookupContext, vin: &str) -> Response<VehicleRecord> {
        let candidate = vin.trim().to_uppercase();
        let response = match validate_vin(&candidate) {
            Ok(()) => {
                let result = self.resolve(ctx, &Identifier::Vin(candidate.clone())).await;
                self.settle(result, "decode_vin")
            }
            Err(e) => self.gaps.invalid_input(&e.to_string()),
        };
        self.audit.record(ctx, &candidate, LookupType::Vin, &response);
        response
    }

    async fn resolve(
        &self,
        ctx: &LookupContext,
        id: &Identifier,
    ) -> EngineResult<Response<VehicleRecord>> {
        match self.chain.resolve(ctx, id).await? {
            Some(resolution) => Ok(self.found_vehicle(ctx, resolution).await),
            None => Ok(self.vehicle_gap(ctx, id).await),
        }
    }

    async fn found_vehicle(
        &self,
        ctx: &LookupContext,
        resolution: Resolution,
    ) -> Response<VehicleRecord> {
        let Resolution {
            record,
            stage,
            stored_confidence,
            detail,
        } = resolution;

        let mut ledger = SourceLedger::new();
        ledger.record_vehicle(&record);
        let why = self
            .scorer
            .explain(stage, &detail, stored_confidence, record.confidence);
        let confidence = record.confidence;
        let source = ledger.primary_source();

        let mut response = Response::found(
            record.clone(),
            stage.outcome(),
            confidence,
            source,
            ledger.into_entries(),
            why,
        );

        match stage {
            Stage::Exact => {}
            Stage::Partial => {
                response = response
                    .with_disclaimer(
                        "Partial identification: only part of the identifier matched a \
                         recorded vehicle. Verify make, model and year before relying on it.",
                    )
                    .with_next_steps(vec![NextStep::new(
                        "Verify the vehicle details",
                        "Confirm the identification against the registration or export certificate.",
                        Priority::High,
                        "verification",
                    )]);
            }
            Stage::Heuristic => {
                response = response.with_disclaimer(
                    "Identified from an enthusiast naming rule, not a database record. \
                     Confirm the chassis code on the vehicle.",
                );
            }
        }
        if stage == Stage::Exact && confidence.value() < self.config.review_threshold {
            response = response.with_disclaimer(
                "The source for this record has low confidence; verify before relying on it.",
            );
        }

        self.enrich(ctx, &record, &mut response).await;
        response
    }

    /// Import risk and strategic recommendations for an identified vehicle.
    /// Enrichment is best-effort: store failures leave the fields unset.
    async fn enrich(
        &self,
        ctx: &LookupContext,
        record: &VehicleRecord,
        response: &mut Response<VehicleRecord>,
    ) {
        let destination = canonical_country(
            ctx.destination
                .as_deref()
                .unwrap_or(&self.config.default_destination),
        );

        let age_threshold = match ctx
            .guard(self.store.compliance_policy(&destination, None))
            .await
        {
            Ok(policy) => policy
                .and_then(|p| p.min_age_years)
                .unwrap_or(DEFAULT_AGE_THRESHOLD),
            Err(e) => {
                tracing::warn!(error = %e, destination = %destination, "policy lookup for risk failed");
                DEFAULT_AGE_THRESHOLD
            }
        };

        response.import_risk_index = Some(risk::assess(&RiskInput {
            make: &record.make,
            model: &record.model,
            year: record.reference_year(),
            destination: &destination,
            age_threshold,
            current_year: Utc::now().year(),
        }));

        match ctx
            .guard(
                self.store
                    .recommendation_rules(&record.make, &record.model, &destination),
            )
            .await
        {
            Ok(rules) => {
                let ranked = risk::rank_recommendations(rules, self.config.max_recommendations);
                if !ranked.is_empty() {
                    response.strategic_recommendations = Some(ranked);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, destination = %destination, "recommendation lookup failed");
            }
        }
    }

    async fn vehicle_gap(&self, ctx: &LookupContext, id: &Identifier) -> Response<VehicleRecord> {
        let keywords = match id {
            Identifier::Vin(_) => Vec::new(),
            Identifier::ChassisCode(_) | Identifier::Query(_) => {
                let query = PatternQuery::new(&id.pattern_key());
                match ctx
                    .guard(
                        self.store
                            .fallback_keywords(&query, self.config.max_fallback_suggestions),
                    )
                    .await
                {
                    Ok(keywords) => keywords,
                    Err(e) => {
                        tracing::warn!(error = %e, "fallback keyword lookup failed");
                        Vec::new()
                    }
                }
            }
        };
        tracing::debug!(identifier = id.as_str(), suggestions = keywords.len(), "no resolver matched");
        self.gaps.no_match(id, keywords)
    }

    // ── Reference data ──────────────────────────────────────────

    /// Import eligibility for a destination, optionally for a model year.
    pub async fn check_compliance(
        &self,
        ctx: &LookupContext,
        country: &str,
        year: Option<i32>,
        region: Option<&str>,
    ) -> Response<ComplianceResult> {
        let key = canonical_country(country);
        let region = region.map(str::trim).filter(|r| !r.is_empty());
        let result = self.compliance(ctx, &key, year, region).await;
        let response = self.settle(result, "check_compliance");

        let mut query = key;
        if let Some(region) = region {
            query.push_str(&format!(" / {region}"));
        }
        if let Some(year) = year {
            query.push_str(&format!(" {year}"));
        }
        self.audit.record(ctx, &query, LookupType::Compliance, &response);
        response
    }

    async fn compliance(
        &self,
        ctx: &LookupContext,
        country: &str,
        year: Option<i32>,
        region: Option<&str>,
    ) -> EngineResult<Response<ComplianceResult>> {
        if country.is_empty() {
            return Ok(self.gaps.invalid_input("a destination country is required"));
        }
        let current_year = Utc::now().year();
        if let Some(year) = year
            && year > current_year
        {
            return Ok(self
                .gaps
                .invalid_input(&format!("model year {year} is in the future")));
        }
        if let Some(year) = year
            && year < EARLIEST_MODEL_YEAR
        {
            return Ok(self.gaps.invalid_input(&format!(
                "model year {year} is before {EARLIEST_MODEL_YEAR}"
            )));
        }

        let Some(policy) = ctx
            .guard(self.store.compliance_policy(country, region))
            .await?
        else {
            return Ok(self.gaps.no_data(
                &format!("import policy for {country}"),
                vec![NextStep::new(
                    "Consult a licensed customs broker",
                    format!("A broker can confirm the current import rules for {country}."),
                    Priority::High,
                    "professional_help",
                )],
            ));
        };

        let vehicle_age = year.map(|y| {
            current_year
                .checked_sub(y)
                .and_then(|age| u32::try_from(age).ok())
                .unwrap_or(0)
        });
        let is_eligible = vehicle_age.map(|age| policy.admits_age(age));
        let years_until_eligible = vehicle_age.map(|age| policy.years_until_eligible(age));
        let estimated_total_cost = policy.total_cost();

        let mut ledger = SourceLedger::new();
        ledger.record(
            "import policy",
            policy.source.clone(),
            policy.confidence,
            policy.last_verified,
            policy.source_url.clone(),
        );
        if !policy.costs.is_empty() {
            ledger.record(
                "compliance costs",
                policy.source.clone(),
                policy.confidence,
                policy.last_verified,
                policy.source_url.clone(),
            );
        }

        let scope = match &policy.region {
            Some(r) => format!("{country} ({r})"),
            None => country.to_string(),
        };
        let min_age = policy
            .min_age_years
            .map(|m| format!("a minimum age of {m} years"))
            .unwrap_or_else(|| "no minimum age".to_string());
        let (why, steps) = match (vehicle_age, is_eligible) {
            (Some(age), Some(true)) => (
                format!("A {age}-year-old vehicle is eligible for import into {scope}, which requires {min_age}."),
                vec![NextStep::new(
                    "Prepare compliance paperwork",
                    format!("{} requirement(s) apply; see the policy for details.", policy.requirements.len()),
                    Priority::Medium,
                    "compliance",
                )],
            ),
            (Some(age), Some(false)) => {
                let wait = years_until_eligible.unwrap_or(0);
                let why = if wait > 0 {
                    format!("A {age}-year-old vehicle is not yet eligible for {scope}, which requires {min_age}; {wait} year(s) to go.")
                } else {
                    format!("A {age}-year-old vehicle exceeds the maximum age allowed by {scope}.")
                };
                let step = if wait > 0 {
                    NextStep::new(
                        "Wait for eligibility",
                        format!("The vehicle becomes eligible in {wait} year(s)."),
                        Priority::Medium,
                        "timing",
                    )
                } else {
                    NextStep::new(
                        "Look for an exemption scheme",
                        "Some destinations allow older vehicles under special registration.",
                        Priority::Medium,
                        "compliance",
                    )
                };
                (why, vec![step])
            }
            _ => (
                format!("Import policy for {scope} found ({min_age}). Provide a model year to check eligibility."),
                vec![NextStep::new(
                    "Provide the model year",
                    "Eligibility depends on the vehicle's age.",
                    Priority::High,
                    "input",
                )],
            ),
        };

        let confidence = policy.confidence;
        let source = policy.source.clone();
        let data = ComplianceResult {
            policy,
            vehicle_year: year,
            vehicle_age,
            is_eligible,
            years_until_eligible,
            estimated_total_cost,
        };

        Ok(Response::found(
            data,
            Outcome::Resolved,
            confidence,
            source,
            ledger.into_entries(),
            why,
        )
        .with_next_steps(steps)
        .with_disclaimer(REGULATION_DISCLAIMER))
    }

    /// Best shipping route for a lane, plus alternatives.
    pub async fn shipping_estimate(
        &self,
        ctx: &LookupContext,
        origin: &str,
        destination: &str,
    ) -> Response<ShippingEstimate> {
        let origin = canonical_country(origin);
        let destination = canonical_country(destination);
        let result = self.shipping(ctx, &origin, &destination).await;
        let response = self.settle(result, "shipping_estimate");
        self.audit.record(
            ctx,
            &format!("{origin} -> {destination}"),
            LookupType::Shipping,
            &response,
        );
        response
    }

    async fn shipping(
        &self,
        ctx: &LookupContext,
        origin: &str,
        destination: &str,
    ) -> EngineResult<Response<ShippingEstimate>> {
        if origin.is_empty() || destination.is_empty() {
            return Ok(self
                .gaps
                .invalid_input("both origin and destination countries are required"));
        }

        let mut routes = ctx
            .guard(self.store.shipping_routes(origin, destination))
            .await?;
        routes.sort_by(|a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then_with(|| a.cost_minor.cmp(&b.cost_minor))
        });
        let count = routes.len();
        let mut routes = routes.into_iter();
        let Some(primary) = routes.next() else {
            return Ok(self.gaps.no_data(
                &format!("shipping route from {origin} to {destination}"),
                vec![NextStep::new(
                    "Request a freight quote",
                    "A freight forwarder can quote RoRo or container shipping for this lane.",
                    Priority::High,
                    "shipping",
                )
                .with_estimated_time("1-2 days")],
            ));
        };
        let alternatives: Vec<_> = routes.collect();

        let mut ledger = SourceLedger::new();
        ledger.record(
            "primary route",
            primary.source.clone(),
            primary.confidence,
            primary.last_verified,
            None,
        );
        for alt in &alternatives {
            ledger.record(
                "alternative route",
                alt.source.clone(),
                alt.confidence,
                alt.last_verified,
                None,
            );
        }

        let why = format!(
            "{count} route(s) found from {origin} to {destination}. The {} service {} to {} has \
             the highest confidence ({}) at {} over {} days.",
            primary.service_type,
            primary.origin_port,
            primary.destination_port,
            primary.confidence,
            format_minor(primary.cost_minor, &primary.currency),
            primary.transit_days,
        );
        let confidence = primary.confidence;
        let source = primary.source.clone();

        Ok(Response::found(
            ShippingEstimate {
                primary,
                alternatives,
            },
            Outcome::Resolved,
            confidence,
            source,
            ledger.into_entries(),
            why,
        )
        .with_next_steps(vec![NextStep::new(
            "Book with a licensed freight forwarder",
            "Confirm sailing dates, insurance and port fees with the forwarder.",
            Priority::Medium,
            "shipping",
        )])
        .with_disclaimer("Shipping rates fluctuate; figures are indicative."))
    }

    /// Price statistics for a make/model, optionally one model year.
    pub async fn market_pricing(
        &self,
        ctx: &LookupContext,
        make: &str,
        model: &str,
        year: Option<i32>,
    ) -> Response<MarketSummary> {
        let make = canonical_make(make);
        let model = model.trim();
        let result = self.market(ctx, &make, model, year).await;
        let response = self.settle(result, "market_pricing");

        let mut query = format!("{make} {model}");
        if let Some(year) = year {
            query.push_str(&format!(" {year}"));
        }
        self.audit.record(ctx, &query, LookupType::Market, &response);
        response
    }

    async fn market(
        &self,
        ctx: &LookupContext,
        make: &str,
        model: &str,
        year: Option<i32>,
    ) -> EngineResult<Response<MarketSummary>> {
        if make.is_empty() || model.is_empty() {
            return Ok(self.gaps.invalid_input("both make and model are required"));
        }

        let samples = ctx
            .guard(self.store.market_samples(make, model, year))
            .await?;
        let total = samples.len();

        let Some(summary) = summarize(make, model, year, samples.clone()) else {
            return Ok(self.gaps.no_data(
                &format!("market data for {make} {model}"),
                vec![NextStep::new(
                    "Add it to your watchlist",
                    "You will be notified when listings for this vehicle are recorded.",
                    Priority::Medium,
                    "watchlist",
                )],
            ));
        };

        // Newest listing per site, in first-seen order.
        let mut sites: Vec<(String, chrono::DateTime<Utc>)> = Vec::new();
        for sample in samples.iter().filter(|s| s.currency == summary.currency) {
            match sites.iter_mut().find(|(site, _)| *site == sample.source_site) {
                Some((_, newest)) => *newest = (*newest).max(sample.listing_date),
                None => sites.push((sample.source_site.clone(), sample.listing_date)),
            }
        }

        let confidence = market_confidence(summary.sample_count);
        let mut ledger = SourceLedger::new();
        for (site, newest) in &sites {
            ledger.record("market price samples", site.clone(), confidence, *newest, None);
        }
        let attribution = sites
            .iter()
            .map(|(site, _)| site.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let excluded = total - summary.sample_count;
        let mut why = format!(
            "Aggregated {} {} listing(s): average {}, range {} to {}.",
            summary.sample_count,
            summary.currency,
            format_minor(summary.average_price, &summary.currency),
            format_minor(summary.min_price, &summary.currency),
            format_minor(summary.max_price, &summary.currency),
        );
        if excluded > 0 {
            why.push_str(&format!(
                " {excluded} listing(s) in other currencies were excluded."
            ));
        }

        Ok(
            Response::found(summary, Outcome::Resolved, confidence, attribution, ledger.into_entries(), why)
                .with_disclaimer("Past listing prices are indicative, not a valuation."),
        )
    }

    // ── Writes ──────────────────────────────────────────────────

    /// Add a vehicle to a user's watchlist. A duplicate of an existing
    /// entry is reported as success; invalid input or a store failure as `false`.
    pub async fn add_to_watchlist(&self, ctx: &LookupContext, request: WatchlistRequest) -> bool {
        let user_id = request.user_id.trim();
        let make = canonical_make(&request.make);
        let model = request.model.trim();
        if user_id.is_empty() || make.is_empty() || model.is_empty() {
            tracing::debug!("watchlist request missing user, make or model");
            return false;
        }

        let entry = WatchlistEntry {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            make,
            model: model.to_string(),
            year: request.year,
            chassis_code: request
                .chassis_code
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty()),
            max_price: request.max_price,
            notes: request.notes,
            created_at: Utc::now(),
        };

        match ctx.guard(self.store.add_watchlist(&entry)).await {
            Ok(inserted) => {
                tracing::info!(user = %entry.user_id, make = %entry.make, model = %entry.model, inserted, "watchlist updated");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, user = %entry.user_id, "failed to add watchlist entry");
                false
            }
        }
    }

    /// Contribute a pattern by hand. Returns whether it was stored; an
    /// existing pattern for the same key is never overwritten.
    pub async fn suggest_pattern(
        &self,
        ctx: &LookupContext,
        search_pattern: &str,
        suggestion: PatternSuggestion,
    ) -> bool {
        let key = normalize_query(search_pattern);
        let make = canonical_make(&suggestion.make);
        let model = suggestion.model.trim();
        if key.len() < self.config.min_identifier_len || make.is_empty() || model.is_empty() {
            tracing::debug!(pattern = %key, "pattern suggestion rejected as incomplete");
            return false;
        }

        let year_range = match (suggestion.year_start, suggestion.year_end) {
            (Some(start), Some(end)) => match YearRange::new(start, end) {
                Ok(range) => Some(range),
                Err(e) => {
                    tracing::debug!(pattern = %key, error = %e, "pattern suggestion rejected");
                    return false;
                }
            },
            (Some(year), None) | (None, Some(year)) => Some(YearRange::single(year)),
            (None, None) => None,
        };

        let pattern = Pattern {
            id: Uuid::now_v7(),
            search_pattern: key,
            make,
            model: model.to_string(),
            chassis_code: suggestion
                .chassis_code
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty()),
            year_range,
            engine_pattern: suggestion.engine_pattern,
            confidence: Confidence::new(CONTRIBUTED_CONFIDENCE.into()),
            source: CONTRIBUTED_SOURCE.to_string(),
            auto_learned: false,
            created_at: Utc::now(),
        };

        match ctx.guard(self.store.upsert_pattern(&pattern)).await {
            Ok(true) => {
                tracing::info!(pattern = %pattern.search_pattern, "contributed pattern stored");
                true
            }
            Ok(false) => {
                tracing::info!(pattern = %pattern.search_pattern, "pattern already exists, contribution ignored");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, pattern = %pattern.search_pattern, "failed to store contributed pattern");
                false
            }
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Wait for queued audit writes.
    pub async fn flush(&self) {
        self.audit.flush().await;
    }

    /// Drain and stop the audit writer. Lookups after this are not audited.
    pub async fn shutdown(&self) {
        self.audit.shutdown().await;
    }

    fn settle<T: Serialize>(&self, result: EngineResult<Response<T>>, operation: &str) -> Response<T> {
        result.unwrap_or_else(|e: EngineError| {
            if e.is_transient() {
                tracing::error!(operation, error = %e, "lookup failed");
            } else {
                tracing::error!(operation, error = ?e, "lookup failed with a non-transient error");
            }
            self.gaps.system_error(&e)
        })
    }
}
