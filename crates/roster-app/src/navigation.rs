// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Serialize;

use crate::{RecordId, RecordSchema};

pub const RECORD_PAGE: &str = "standard__recordPage";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAttributes {
    pub record_id: RecordId,
    pub object_api_name: &'static str,
    pub action_name: &'static str,
}

/// Navigation target for a record's own page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReference {
    #[serde(rename = "type")]
    pub page_type: &'static str,
    pub attributes: PageAttributes,
}

impl PageReference {
    pub fn record_view(schema: &'static RecordSchema, record_id: RecordId) -> Self {
        Self {
            page_type: RECORD_PAGE,
            attributes: PageAttributes {
                record_id,
                object_api_name: schema.object_api_name,
                action_name: "view",
            },
        }
    }

    pub fn url_path(&self) -> String {
        format!(
            "/lightning/r/{}/{}/{}",
            self.attributes.object_api_name, self.attributes.record_id, self.attributes.action_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::PageReference;
    use crate::{ACCOUNT_SCHEMA, RecordId};

    #[test]
    fn record_view_targets_standard_record_page() {
        let page = PageReference::record_view(&ACCOUNT_SCHEMA, RecordId::from_row("001", 3));
        assert_eq!(page.page_type, "standard__recordPage");
        assert_eq!(page.attributes.object_api_name, "Account");
        assert_eq!(page.url_path(), "/lightning/r/Account/001000000000003/view");
    }
}
