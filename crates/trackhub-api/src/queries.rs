//! The fixed GraphQL documents this client sends.
//!
//! `triggeringCondition` and `triggeredAction` are aliased to `event` and
//! `action` in the trigger fragment; the decode types in this crate and in
//! `trackhub-automations` rely on those aliases.

use std::sync::LazyLock;

const TRIGGER_FIELDS_FRAGMENT: &str = r#"
fragment TriggerFields on Trigger {
    id
    name
    description
    enabled
    createdAt
    updatedAt
    createdBy {
        id
        username
    }
    scope {
        __typename
        ... on Project {
            id
            name
        }
        ... on ArtifactSequence {
            id
            name
        }
        ... on ArtifactPortfolio {
            id
            name
        }
    }
    event: triggeringCondition {
        __typename
        eventType
        filter
    }
    action: triggeredAction {
        __typename
        ... on QueueJobTriggeredAction {
            queue
            template
        }
        ... on NotificationTriggeredAction {
            integration {
                id
                name
            }
            title
            message
            severity
        }
        ... on GenericWebhookTriggeredAction {
            integration {
                id
                name
            }
            requestPayload
        }
        ... on NoOpTriggeredAction {
            noOp
        }
    }
}
"#;

/// List automations across the projects visible to the caller.
pub static TRIGGERS_FOR_VIEWER_GQL: LazyLock<String> = LazyLock::new(|| {
    format!(
        r#"
query TriggersForViewer($cursor: String, $perPage: Int, $projectName: String, $triggerName: String) {{
    searchScope: viewer {{
        projects(after: $cursor, first: $perPage, name: $projectName) {{
            edges {{
                node {{
                    triggers(name: $triggerName) {{
                        ...TriggerFields
                    }}
                }}
            }}
            pageInfo {{
                hasNextPage
                endCursor
            }}
        }}
    }}
}}
{TRIGGER_FIELDS_FRAGMENT}"#
    )
});

/// List automations across a specific entity's projects.
pub static TRIGGERS_BY_ENTITY_GQL: LazyLock<String> = LazyLock::new(|| {
    format!(
        r#"
query TriggersByEntity($entityName: String!, $cursor: String, $perPage: Int, $projectName: String, $triggerName: String) {{
    searchScope: entity(name: $entityName) {{
        projects(after: $cursor, first: $perPage, name: $projectName) {{
            edges {{
                node {{
                    triggers(name: $triggerName) {{
                        ...TriggerFields
                    }}
                }}
            }}
            pageInfo {{
                hasNextPage
                endCursor
            }}
        }}
    }}
}}
{TRIGGER_FIELDS_FRAGMENT}"#
    )
});

pub static CREATE_FILTER_TRIGGER_GQL: LazyLock<String> = LazyLock::new(|| {
    format!(
        r#"
mutation CreateFilterTrigger($input: CreateFilterTriggerInput!) {{
    createFilterTrigger(input: $input) {{
        trigger {{
            ...TriggerFields
        }}
    }}
}}
{TRIGGER_FIELDS_FRAGMENT}"#
    )
});

pub static UPDATE_FILTER_TRIGGER_GQL: LazyLock<String> = LazyLock::new(|| {
    format!(
        r#"
mutation UpdateFilterTrigger($input: UpdateFilterTriggerInput!) {{
    updateFilterTrigger(input: $input) {{
        trigger {{
            ...TriggerFields
        }}
    }}
}}
{TRIGGER_FIELDS_FRAGMENT}"#
    )
});

pub const DELETE_TRIGGER_GQL: &str = r#"
mutation DeleteTrigger($id: ID!) {
    deleteTrigger(triggerID: $id) {
        success
    }
}
"#;

pub const INTEGRATIONS_BY_ENTITY_GQL: &str = r#"
query IntegrationsByEntity($entityName: String!, $cursor: String, $perPage: Int) {
    entity(name: $entityName) {
        integrations(after: $cursor, first: $perPage) {
            edges {
                node {
                    __typename
                    ... on SlackIntegration {
                        id
                        teamName
                        channelName
                    }
                    ... on GenericWebhookIntegration {
                        id
                        name
                        urlEndpoint
                    }
                }
            }
            pageInfo {
                hasNextPage
                endCursor
            }
        }
    }
}
"#;
