use std::collections::BTreeMap;

use serde_json::Value;

use crate::dynamic::DynamicValue;

use super::HttpMethod;

/// Declarative description of one HTTP call, including its dynamic parts.
///
/// Built once through [`EndpointDescriptor::builder`] and then reused by every
/// iteration of every virtual user.
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    name: String,
    method: HttpMethod,
    url: DynamicValue<String>,
    path_params: BTreeMap<String, DynamicValue<Value>>,
    query_params: Vec<(String, DynamicValue<Value>)>,
    body: Option<DynamicValue<Value>>,
    headers: Vec<(String, String)>,
    extract: BTreeMap<String, String>,
}

impl EndpointDescriptor {
    pub fn builder<N, U>(name: N, method: HttpMethod, url: U) -> EndpointBuilder
    where
        N: Into<String>,
        U: Into<DynamicValue<String>>,
    {
        EndpointBuilder {
            endpoint: EndpointDescriptor {
                name: name.into(),
                method,
                url: url.into(),
                path_params: BTreeMap::new(),
                query_params: Vec::new(),
                body: None,
                headers: Vec::new(),
                extract: BTreeMap::new(),
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub const fn url(&self) -> &DynamicValue<String> {
        &self.url
    }

    #[must_use]
    pub const fn path_params(&self) -> &BTreeMap<String, DynamicValue<Value>> {
        &self.path_params
    }

    /// Query parameters in declaration order.
    #[must_use]
    pub fn query_params(&self) -> &[(String, DynamicValue<Value>)] {
        &self.query_params
    }

    #[must_use]
    pub const fn body(&self) -> Option<&DynamicValue<Value>> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Context key to response path mapping applied after the call.
    #[must_use]
    pub const fn extract(&self) -> &BTreeMap<String, String> {
        &self.extract
    }
}

#[derive(Debug, Clone)]
pub struct EndpointBuilder {
    endpoint: EndpointDescriptor,
}

impl EndpointBuilder {
    #[must_use]
    pub fn path_param<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<DynamicValue<Value>>,
    {
        self.endpoint.path_params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn query_param<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<DynamicValue<Value>>,
    {
        let key = key.into();
        let value = value.into();
        match self
            .endpoint
            .query_params
            .iter_mut()
            .find(|(existing, _)| *existing == key)
        {
            Some((_, slot)) => *slot = value,
            None => self.endpoint.query_params.push((key, value)),
        }
        self
    }

    #[must_use]
    pub fn body<V>(mut self, body: V) -> Self
    where
        V: Into<DynamicValue<Value>>,
    {
        self.endpoint.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.endpoint.headers.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn extract<K, P>(mut self, key: K, path: P) -> Self
    where
        K: Into<String>,
        P: Into<String>,
    {
        self.endpoint.extract.insert(key.into(), path.into());
        self
    }

    #[must_use]
    pub fn build(self) -> EndpointDescriptor {
        self.endpoint
    }
}
