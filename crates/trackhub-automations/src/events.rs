//! Events that trigger automations.

use std::fmt;
use std::ops::{BitAnd, Shr};

use serde::{Deserialize, Serialize};

use crate::actions::ActionInput;
use crate::automations::NewAutomation;
use crate::filters::{Filter, FilterField, Op, empty_or_and, wrap_and, wrap_or_and};
use crate::scopes::Scope;
use crate::serde_util::json_string;

/// The type of event that triggers an automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "CREATE_ARTIFACT")]
    CreateArtifact,
    /// An artifact was linked to a collection.
    #[serde(rename = "LINK_MODEL")]
    LinkArtifact,
    #[serde(rename = "ADD_ARTIFACT_ALIAS")]
    AddArtifactAlias,
    #[serde(rename = "UPDATE_ARTIFACT_ALIAS")]
    UpdateArtifactAlias,
    #[serde(rename = "RUN_METRIC")]
    RunMetric,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateArtifact => "CREATE_ARTIFACT",
            Self::LinkArtifact => "LINK_MODEL",
            Self::AddArtifactAlias => "ADD_ARTIFACT_ALIAS",
            Self::UpdateArtifactAlias => "UPDATE_ARTIFACT_ALIAS",
            Self::RunMetric => "RUN_METRIC",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported metric aggregation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Agg {
    Max,
    Min,
    Average,
}

/// Comparison operators accepted in metric threshold conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricCmp {
    #[serde(rename = "$gte")]
    Gte,
    #[serde(rename = "$gt")]
    Gt,
    #[serde(rename = "$lt")]
    Lt,
    #[serde(rename = "$lte")]
    Lte,
}

/// A threshold condition on a (possibly aggregated) run metric.
///
/// JSON keys here are snake_case on the wire, and `agg_op` is emitted even
/// when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFilter {
    pub name: String,
    #[serde(default = "default_window_size")]
    pub window_size: u32,
    pub agg_op: Option<Agg>,
    pub cmp_op: MetricCmp,
    pub threshold: f64,
}

fn default_window_size() -> u32 {
    1
}

/// A named run metric, optionally aggregated over a trailing window of
/// history rows. Terminal comparison methods produce a [`MetricFilter`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricOperand {
    name: String,
    agg_op: Option<Agg>,
    window_size: u32,
}

impl MetricOperand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agg_op: None,
            window_size: 1,
        }
    }

    fn agg(mut self, op: Agg, window: u32) -> Self {
        self.agg_op = Some(op);
        self.window_size = window;
        self
    }

    pub fn max(self, window: u32) -> Self {
        self.agg(Agg::Max, window)
    }

    pub fn min(self, window: u32) -> Self {
        self.agg(Agg::Min, window)
    }

    pub fn average(self, window: u32) -> Self {
        self.agg(Agg::Average, window)
    }

    /// Alias for [`Self::average`].
    pub fn mean(self, window: u32) -> Self {
        self.average(window)
    }

    fn cmp(self, cmp_op: MetricCmp, threshold: f64) -> MetricFilter {
        MetricFilter {
            name: self.name,
            window_size: self.window_size,
            agg_op: self.agg_op,
            cmp_op,
            threshold,
        }
    }

    pub fn gt(self, threshold: impl Into<f64>) -> MetricFilter {
        self.cmp(MetricCmp::Gt, threshold.into())
    }

    pub fn gte(self, threshold: impl Into<f64>) -> MetricFilter {
        self.cmp(MetricCmp::Gte, threshold.into())
    }

    pub fn lt(self, threshold: impl Into<f64>) -> MetricFilter {
        self.cmp(MetricCmp::Lt, threshold.into())
    }

    pub fn lte(self, threshold: impl Into<f64>) -> MetricFilter {
        self.cmp(MetricCmp::Lte, threshold.into())
    }
}

/// The combined run selection and metric threshold for a `RUN_METRIC`
/// event. Both halves are embedded as JSON strings on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetricFilter {
    #[serde(with = "json_string", default = "empty_and")]
    pub run_filter: Filter,
    #[serde(with = "json_string")]
    pub metric_filter: MetricFilter,
}

fn empty_and() -> Filter {
    Filter::Op(Op::And(Vec::new()))
}

impl RunMetricFilter {
    /// Pair a run filter with a metric threshold. The run filter is
    /// normalized to a top-level `$and`.
    pub fn new(run_filter: Filter, metric_filter: MetricFilter) -> Self {
        Self {
            run_filter: wrap_and(run_filter),
            metric_filter,
        }
    }
}

impl From<MetricFilter> for RunMetricFilter {
    /// A bare metric threshold triggers on all runs in scope.
    fn from(metric_filter: MetricFilter) -> Self {
        Self {
            run_filter: empty_and(),
            metric_filter,
        }
    }
}

impl BitAnd<MetricFilter> for Filter {
    type Output = RunMetricFilter;

    fn bitand(self, rhs: MetricFilter) -> RunMetricFilter {
        RunMetricFilter::new(self, rhs)
    }
}

impl BitAnd<Filter> for MetricFilter {
    type Output = RunMetricFilter;

    fn bitand(self, rhs: Filter) -> RunMetricFilter {
        RunMetricFilter::new(rhs, self)
    }
}

/// Filterable fields of run events.
pub struct RunEvent;

impl RunEvent {
    /// `Run.name` is filtered on `display_name` in the backend, so route
    /// it there instead of expecting callers to know.
    pub fn name() -> FilterField {
        FilterField::new("display_name")
    }

    /// Start a metric threshold condition.
    pub fn metric(name: impl Into<String>) -> MetricOperand {
        MetricOperand::new(name)
    }
}

/// Filterable fields of artifact events.
pub struct ArtifactEvent;

impl ArtifactEvent {
    pub fn alias() -> FilterField {
        FilterField::new("alias")
    }
}

/// The filter payload of an input event, in its canonical write shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventFilter {
    RunMetric(RunMetricFilter),
    Expr(Filter),
}

/// A triggering event for a new automation, carrying its own scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    event_type: EventType,
    scope: Scope,
    filter: EventFilter,
}

impl Event {
    fn artifact_event(event_type: EventType, scope: Scope) -> Self {
        Self {
            event_type,
            scope,
            filter: EventFilter::Expr(empty_or_and()),
        }
    }

    /// A new artifact is created.
    pub fn on_create_artifact(scope: impl Into<Scope>) -> Self {
        Self::artifact_event(EventType::CreateArtifact, scope.into())
    }

    /// A new artifact is linked to a collection.
    pub fn on_link_artifact(scope: impl Into<Scope>) -> Self {
        Self::artifact_event(EventType::LinkArtifact, scope.into())
    }

    /// A new alias is assigned to an artifact.
    pub fn on_add_artifact_alias(scope: impl Into<Scope>) -> Self {
        Self::artifact_event(EventType::AddArtifactAlias, scope.into())
    }

    /// An existing artifact alias is moved.
    pub fn on_update_artifact_alias(scope: impl Into<Scope>) -> Self {
        Self::artifact_event(EventType::UpdateArtifactAlias, scope.into())
    }

    /// A run metric satisfies a condition. Scope/event compatibility is
    /// enforced by the backend, not locally.
    pub fn on_run_metric(scope: impl Into<Scope>, filter: impl Into<RunMetricFilter>) -> Self {
        Self {
            event_type: EventType::RunMetric,
            scope: scope.into(),
            filter: EventFilter::RunMetric(filter.into()),
        }
    }

    /// Replace the event filter, normalizing it to the wrapped
    /// `$or`/`$and` shape artifact events are stored with.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = EventFilter::Expr(wrap_or_and(filter));
        self
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    pub(crate) fn from_parts(event_type: EventType, scope: Scope, filter: EventFilter) -> Self {
        Self {
            event_type,
            scope,
            filter,
        }
    }

    /// Define the action this event triggers, producing an unsaved
    /// automation whose scope is taken from the event.
    pub fn triggers(self, action: impl Into<ActionInput>) -> NewAutomation {
        NewAutomation {
            scope: Some(self.scope.clone()),
            event: Some(self),
            action: Some(action.into()),
            ..NewAutomation::default()
        }
    }
}

/// Syntactic sugar mirroring the event-to-action arrow: `event >> action`.
impl<A: Into<ActionInput>> Shr<A> for Event {
    type Output = NewAutomation;

    fn shr(self, action: A) -> NewAutomation {
        self.triggers(action)
    }
}

/// The triggering condition of a saved automation, as returned by reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedEvent {
    #[serde(rename = "eventType")]
    pub event_type: EventType,
    #[serde(with = "json_string")]
    pub filter: SavedEventFilter,
}

/// Read-shape event filters. Reads wrap plain expression trees in an
/// extra `filter` key; `RUN_METRIC` filters come back unwrapped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SavedEventFilter {
    Wrapped(WrappedEventFilter),
    RunMetric(RunMetricFilter),
    Expr(Filter),
}

/// The `{"filter": "..."}` wrapper reads place around a filter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrappedEventFilter {
    #[serde(with = "json_string")]
    pub filter: Filter,
}

impl WrappedEventFilter {
    pub fn into_inner(self) -> Filter {
        self.filter
    }
}

impl SavedEventFilter {
    /// Convert the read shape to the canonical write shape, unwrapping
    /// the extra `filter` key if present. One-way: writes never produce
    /// the wrapped form.
    pub fn into_event_filter(self) -> EventFilter {
        match self {
            Self::Wrapped(wrapped) => EventFilter::Expr(wrapped.into_inner()),
            Self::RunMetric(filter) => EventFilter::RunMetric(filter),
            Self::Expr(filter) => EventFilter::Expr(filter),
        }
    }
}
