//! Event resource (the unversioned shell around event versions)

use catalog::{Catalog, Event};
use declarative::{Comparison, FieldSpec, Reconcile, ResourceIdentity, Result, TaskContext, compare};

use super::{api_error, find_unique, require_id};

const KIND: &str = "event";

const FIELDS: &[FieldSpec] = &[FieldSpec::ordered("shared")];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSettings {
    pub name: String,
    pub domain_id: String,
    pub shared: bool,
}

pub struct EventTask<'a> {
    catalog: &'a Catalog,
    settings: EventSettings,
}

impl<'a> EventTask<'a> {
    pub fn new(catalog: &'a Catalog, settings: EventSettings) -> Self {
        Self { catalog, settings }
    }

    fn desired(&self) -> Event {
        Event {
            id: None,
            name: self.settings.name.clone(),
            application_domain_id: self.settings.domain_id.clone(),
            shared: self.settings.shared,
        }
    }
}

impl Reconcile for EventTask<'_> {
    type Resource = Event;

    fn identity(&self) -> ResourceIdentity {
        ResourceIdentity::new(KIND, &self.settings.name).scoped(&self.settings.domain_id)
    }

    fn fetch(&self) -> Result<Option<Event>> {
        find_unique(
            self.catalog,
            &self.identity(),
            &[
                ("name", self.settings.name.as_str()),
                ("applicationDomainId", self.settings.domain_id.as_str()),
            ],
        )
    }

    fn diff(&self, current: &Event) -> Result<Comparison> {
        compare(current, &self.desired(), FIELDS)
    }

    fn create(&self, ctx: &mut TaskContext<'_>) -> Result<Event> {
        self.catalog
            .create(&self.desired())
            .map_err(api_error("create event", ctx.identity()))
    }

    fn update(&self, current: &Event, ctx: &mut TaskContext<'_>) -> Result<Event> {
        let id = require_id(current, "update event", ctx.identity())?;
        self.catalog
            .update(&id, &self.desired())
            .map_err(api_error("update event", ctx.identity()))
    }
}
