//! Query parameter handling
//!
//! Every CloudStack call is a flat set of string parameters. [`Params`] keeps
//! them in a sorted map and knows how CloudStack expects lists and maps to be
//! flattened. Operation-specific builders wrap a `Params` and implement
//! [`ApiRequest`].

use std::collections::{BTreeMap, HashMap};

/// A set of query parameters for one API call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: BTreeMap<String, String>,
}

impl Params {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a string parameter
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Set a boolean parameter (`true` / `false`)
    pub fn set_bool(&mut self, key: &str, value: bool) -> &mut Self {
        self.set(key, value.to_string())
    }

    /// Set an integer parameter
    pub fn set_int(&mut self, key: &str, value: i64) -> &mut Self {
        self.set(key, value.to_string())
    }

    /// Set a list parameter as a comma-separated value
    ///
    /// Empty lists are not sent.
    pub fn set_list<I, S>(&mut self, key: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        if !joined.is_empty() {
            self.set(key, joined);
        }
        self
    }

    /// Set a key/value map, as used by `tags`:
    /// `tags[0].key=env&tags[0].value=prod`
    ///
    /// Entries are emitted in key order so requests are reproducible.
    pub fn set_key_value_map(&mut self, key: &str, map: &HashMap<String, String>) -> &mut Self {
        for (i, (k, v)) in sorted(map).into_iter().enumerate() {
            self.set(&format!("{}[{}].key", key, i), k);
            self.set(&format!("{}[{}].value", key, i), v);
        }
        self
    }

    /// Set a detail map, as used by `details`: `details[0].cpuNumber=2`
    pub fn set_detail_map(&mut self, key: &str, map: &HashMap<String, String>) -> &mut Self {
        for (i, (k, v)) in sorted(map).into_iter().enumerate() {
            self.set(&format!("{}[{}].{}", key, i, k), v);
        }
        self
    }

    /// Get a parameter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns true if the parameter is set
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Remove a parameter
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no parameters are set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over parameters in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn sorted(map: &HashMap<String, String>) -> Vec<(&String, &String)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

/// A typed request for a single CloudStack command
pub trait ApiRequest {
    /// The CloudStack command name, e.g. `listVirtualMachines`
    const COMMAND: &'static str;

    /// Whether the request may carry a large payload and should be POSTed
    const PREFER_POST: bool = false;

    /// The parameters for this call, excluding `command`, `response` and
    /// authentication
    fn params(&self) -> &Params;
}

/// Generates a chainable setter on a params builder
macro_rules! param_setters {
    ($($(#[$meta:meta])* $name:ident => $key:literal),* $(,)?) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $name(mut self, value: impl Into<String>) -> Self {
                self.params.set($key, value);
                self
            }
        )*
    };
}

macro_rules! bool_setters {
    ($($(#[$meta:meta])* $name:ident => $key:literal),* $(,)?) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $name(mut self, value: bool) -> Self {
                self.params.set_bool($key, value);
                self
            }
        )*
    };
}

macro_rules! int_setters {
    ($($(#[$meta:meta])* $name:ident => $key:literal),* $(,)?) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $name(mut self, value: i64) -> Self {
                self.params.set_int($key, value);
                self
            }
        )*
    };
}

macro_rules! list_setters {
    ($($(#[$meta:meta])* $name:ident => $key:literal),* $(,)?) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $name<I, S>(mut self, values: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: AsRef<str>,
            {
                self.params.set_list($key, values);
                self
            }
        )*
    };
}

/// Declares a params builder struct bound to a command
macro_rules! api_request {
    ($(#[$meta:meta])* $name:ident => $command:literal) => {
        $crate::params::api_request!($(#[$meta])* $name => $command, post = false);
    };
    ($(#[$meta:meta])* $name:ident => $command:literal, post = $post:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            params: $crate::params::Params,
        }

        impl $crate::params::ApiRequest for $name {
            const COMMAND: &'static str = $command;
            const PREFER_POST: bool = $post;

            fn params(&self) -> &$crate::params::Params {
                &self.params
            }
        }
    };
}

/// Adds the pagination and filter setters shared by `list*` commands
macro_rules! list_filters {
    () => {
        $crate::params::param_setters! {
            /// Filter by account name (requires `domain_id`)
            account => "account",
            /// Filter by domain
            domain_id => "domainid",
            /// Filter by keyword
            keyword => "keyword",
            /// Restrict to a project
            project_id => "projectid",
        }
        $crate::params::bool_setters! {
            /// List resources from all accessible accounts
            list_all => "listall",
            /// Include resources from subdomains
            is_recursive => "isrecursive",
        }
        $crate::params::int_setters! {
            /// Page number, starting at 1
            page => "page",
            /// Items per page
            page_size => "pagesize",
        }
    };
}

/// Adds a `tags` filter setter to a list builder
macro_rules! tag_filter {
    () => {
        /// Filter by resource tags
        #[must_use]
        pub fn tags(mut self, tags: &std::collections::HashMap<String, String>) -> Self {
            self.params.set_key_value_map("tags", tags);
            self
        }
    };
}

/// Adds a `new(id)` constructor for commands addressed by one id parameter
macro_rules! id_constructor {
    ($key:literal) => {
        pub fn new(id: impl Into<String>) -> Self {
            let mut request = Self::default();
            request.params.set($key, id);
            request
        }
    };
}

pub(crate) use {
    api_request, bool_setters, id_constructor, int_setters, list_filters, list_setters,
    param_setters, tag_filter,
};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar_setters() {
        let mut params = Params::new();
        params
            .set("zoneid", "zone-1")
            .set_bool("forced", true)
            .set_int("size", 20);

        assert_eq!(params.get("zoneid"), Some("zone-1"));
        assert_eq!(params.get("forced"), Some("true"));
        assert_eq!(params.get("size"), Some("20"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_list_setter_joins_and_skips_empty() {
        let mut params = Params::new();
        params.set_list("networkids", ["net-1", "net-2"]);
        params.set_list("securitygroupids", Vec::<String>::new());

        assert_eq!(params.get("networkids"), Some("net-1,net-2"));
        assert!(!params.contains("securitygroupids"));
    }

    #[test]
    fn test_key_value_map_is_indexed_in_key_order() {
        let tags = HashMap::from([
            ("team".to_string(), "ops".to_string()),
            ("env".to_string(), "prod".to_string()),
        ]);
        let mut params = Params::new();
        params.set_key_value_map("tags", &tags);

        let flattened: Vec<_> = params.iter().collect();
        assert_eq!(
            flattened,
            vec![
                ("tags[0].key", "env"),
                ("tags[0].value", "prod"),
                ("tags[1].key", "team"),
                ("tags[1].value", "ops"),
            ]
        );
    }

    #[test]
    fn test_detail_map() {
        let details = HashMap::from([
            ("memory".to_string(), "2048".to_string()),
            ("cpuNumber".to_string(), "2".to_string()),
        ]);
        let mut params = Params::new();
        params.set_detail_map("details", &details);

        assert_eq!(params.get("details[0].cpuNumber"), Some("2"));
        assert_eq!(params.get("details[1].memory"), Some("2048"));
    }

    #[test]
    fn test_from_iterator_and_remove() {
        let mut params: Params = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(params.remove("a"), Some("1".to_string()));
        assert_eq!(params.len(), 1);
        assert!(!params.is_empty());
    }
}
