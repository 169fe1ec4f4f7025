//! Closed registry of admin resources and their backend function table.

use crate::config::types::{FieldKind, FieldSchema, ListMode, ResourceConfig};
use crate::config::validate;
use crate::error::{AdapterError, ConfigError};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Every resource the admin panel exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Resource {
    #[serde(rename = "services")]
    Services,
    #[serde(rename = "testimonials")]
    Testimonials,
    #[serde(rename = "faqs")]
    Faqs,
    #[serde(rename = "blogPosts")]
    BlogPosts,
    #[serde(rename = "teamMembers")]
    TeamMembers,
    #[serde(rename = "leads")]
    Leads,
    #[serde(rename = "siteSettings")]
    SiteSettings,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Services,
        Resource::Testimonials,
        Resource::Faqs,
        Resource::BlogPosts,
        Resource::TeamMembers,
        Resource::Leads,
        Resource::SiteSettings,
    ];

    /// Name used by the UI data provider and in URLs.
    pub fn name(self) -> &'static str {
        match self {
            Resource::Services => "services",
            Resource::Testimonials => "testimonials",
            Resource::Faqs => "faqs",
            Resource::BlogPosts => "blogPosts",
            Resource::TeamMembers => "teamMembers",
            Resource::Leads => "leads",
            Resource::SiteSettings => "siteSettings",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Built-in backend function table.
    pub fn default_config(self) -> ResourceConfig {
        match self {
            Resource::Services => ResourceConfig::read_only(
                "services",
                "services:list",
                "services:get",
                SERVICE_FIELDS,
            )
            .create("services:create")
            .update("services:update")
            .delete("services:remove")
            .slug("slug", Some("services:getBySlug")),
            Resource::Testimonials => ResourceConfig::read_only(
                "testimonials",
                "testimonials:list",
                "testimonials:get",
                TESTIMONIAL_FIELDS,
            )
            .create("testimonials:create")
            .update("testimonials:update")
            .delete("testimonials:remove"),
            Resource::Faqs => ResourceConfig::read_only("faqs", "faqs:list", "faqs:get", FAQ_FIELDS)
                .create("faqs:create")
                .update("faqs:update")
                .delete("faqs:remove")
                .id_arg("faqId"),
            Resource::BlogPosts => ResourceConfig::read_only(
                "blogPosts",
                "blog:list",
                "blog:get",
                BLOG_POST_FIELDS,
            )
            .create("blog:create")
            .update("blog:update")
            .delete("blog:remove")
            .id_arg("postId")
            .slug("slug", None)
            .list_mode(ListMode::Native),
            Resource::TeamMembers => ResourceConfig::read_only(
                "teamMembers",
                "team:list",
                "team:get",
                TEAM_MEMBER_FIELDS,
            )
            .create("team:create")
            .update("team:update")
            .delete("team:remove")
            .id_arg("memberId"),
            // Leads arrive through the public contact form, never from the admin panel.
            Resource::Leads => ResourceConfig::read_only("leads", "leads:list", "leads:get", LEAD_FIELDS)
                .update("leads:updateStatus")
                .delete("leads:remove")
                .id_arg("leadId"),
            Resource::SiteSettings => ResourceConfig::read_only(
                "siteSettings",
                "settings:list",
                "settings:get",
                SITE_SETTINGS_FIELDS,
            )
            .update("settings:update"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| AdapterError::unknown_resource(s))
    }
}

const SERVICE_FIELDS: &[FieldSchema] = &[
    FieldSchema::required("title", FieldKind::String),
    FieldSchema::required("slug", FieldKind::String),
    FieldSchema::required("summary", FieldKind::String),
    FieldSchema::optional("description", FieldKind::String),
    FieldSchema::optional("icon", FieldKind::String),
    FieldSchema::optional("features", FieldKind::Array),
    FieldSchema::required("order", FieldKind::Number),
    FieldSchema::required("published", FieldKind::Boolean),
];

const TESTIMONIAL_FIELDS: &[FieldSchema] = &[
    FieldSchema::required("author", FieldKind::String),
    FieldSchema::optional("company", FieldKind::String),
    FieldSchema::required("quote", FieldKind::String),
    FieldSchema::required("rating", FieldKind::Number),
    FieldSchema::optional("order", FieldKind::Number),
    FieldSchema::optional("featured", FieldKind::Boolean),
];

const FAQ_FIELDS: &[FieldSchema] = &[
    FieldSchema::required("question", FieldKind::String),
    FieldSchema::required("answer", FieldKind::String),
    FieldSchema::optional("category", FieldKind::String),
    FieldSchema::required("order", FieldKind::Number),
];

const BLOG_POST_FIELDS: &[FieldSchema] = &[
    FieldSchema::required("title", FieldKind::String),
    FieldSchema::required("slug", FieldKind::String),
    FieldSchema::optional("excerpt", FieldKind::String),
    FieldSchema::required("body", FieldKind::String),
    FieldSchema::optional("author", FieldKind::String),
    FieldSchema::optional("coverImage", FieldKind::String),
    FieldSchema::optional("tags", FieldKind::Array),
    FieldSchema::optional("publishedAt", FieldKind::Number),
    FieldSchema::required("published", FieldKind::Boolean),
];

const TEAM_MEMBER_FIELDS: &[FieldSchema] = &[
    FieldSchema::required("name", FieldKind::String),
    FieldSchema::required("role", FieldKind::String),
    FieldSchema::optional("bio", FieldKind::String),
    FieldSchema::optional("photoUrl", FieldKind::String),
    FieldSchema::optional("certifications", FieldKind::Array),
    FieldSchema::required("order", FieldKind::Number),
];

const LEAD_FIELDS: &[FieldSchema] = &[
    FieldSchema::required("name", FieldKind::String),
    FieldSchema::required("email", FieldKind::String),
    FieldSchema::optional("phone", FieldKind::String),
    FieldSchema::optional("company", FieldKind::String),
    FieldSchema::optional("serviceId", FieldKind::Id),
    FieldSchema::required("message", FieldKind::String),
    FieldSchema::optional("status", FieldKind::String),
    FieldSchema::optional("notes", FieldKind::String),
];

const SITE_SETTINGS_FIELDS: &[FieldSchema] = &[
    FieldSchema::required("siteName", FieldKind::String),
    FieldSchema::required("phone", FieldKind::String),
    FieldSchema::required("email", FieldKind::String),
    FieldSchema::optional("address", FieldKind::String),
    FieldSchema::optional("social", FieldKind::Object),
];

/// Validated, immutable config table: exactly one entry per [`Resource`].
#[derive(Clone, Debug)]
pub struct Registry {
    entries: Vec<ResourceConfig>,
}

impl Registry {
    /// Registry with the built-in function table.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_entries(Resource::ALL.into_iter().map(|r| (r, r.default_config())))
    }

    /// Build from explicit entries. Every resource must appear exactly once.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (Resource, ResourceConfig)>,
    ) -> Result<Self, ConfigError> {
        let mut slots: Vec<Option<ResourceConfig>> = vec![None; Resource::ALL.len()];
        for (resource, config) in entries {
            let slot = &mut slots[resource.index()];
            if slot.is_some() {
                return Err(ConfigError::DuplicateResource(resource.name().to_string()));
            }
            *slot = Some(config);
        }
        let mut configs = Vec::with_capacity(slots.len());
        for (resource, slot) in Resource::ALL.into_iter().zip(slots) {
            let config = slot.ok_or_else(|| ConfigError::MissingResource(resource.name().to_string()))?;
            configs.push(config);
        }
        let registry = Registry { entries: configs };
        validate(&registry)?;
        Ok(registry)
    }

    /// Builtin registry with one entry replaced; convenient for deployments with renamed functions.
    pub fn with_override(mut self, resource: Resource, config: ResourceConfig) -> Result<Self, ConfigError> {
        self.entries[resource.index()] = config;
        validate(&self)?;
        Ok(self)
    }

    pub fn get(&self, resource: Resource) -> &ResourceConfig {
        &self.entries[resource.index()]
    }

    /// Look up by UI resource name.
    pub fn resolve(&self, name: &str) -> Result<(Resource, &ResourceConfig), AdapterError> {
        let resource: Resource = name.parse()?;
        Ok((resource, self.get(resource)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, &ResourceConfig)> {
        Resource::ALL.into_iter().zip(self.entries.iter())
    }
}
