//! Builder for Datastar action attributes that call `/rpc/*` routes.
//!
//! ```
//! use spotigo_star::rpc;
//!
//! let action = rpc::post("queue-track").param("track_id", "abc").build();
//! assert_eq!(action, "@post('/rpc/queue-track?track_id=abc', {})");
//! ```

/// HTTP method of the generated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    Get,
    Post,
}

impl RpcMethod {
    fn action(&self) -> &'static str {
        match self {
            RpcMethod::Get => "@get",
            RpcMethod::Post => "@post",
        }
    }
}

/// Action attribute under construction.
#[derive(Debug, Clone)]
pub struct RpcAction {
    path: String,
    method: RpcMethod,
    params: Vec<(String, String)>,
    include: Option<String>,
    exclude: Option<String>,
}

pub fn post(path: &str) -> RpcAction {
    RpcAction::new(path, RpcMethod::Post)
}

pub fn get(path: &str) -> RpcAction {
    RpcAction::new(path, RpcMethod::Get)
}

impl RpcAction {
    pub fn new(path: &str, method: RpcMethod) -> Self {
        Self {
            path: path.trim_start_matches('/').to_string(),
            method,
            params: Vec::new(),
            include: None,
            exclude: None,
        }
    }

    /// Add a query parameter. Repeated keys are kept.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Only send signals matching this JS regex literal, e.g. `/^dialog_/`.
    pub fn include(mut self, pattern: impl Into<String>) -> Self {
        self.include = Some(pattern.into());
        self
    }

    /// Never send signals matching this JS regex literal.
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude = Some(pattern.into());
        self
    }

    pub fn url(&self) -> String {
        let mut url = format!("/rpc/{}", self.path);
        if !self.params.is_empty() {
            let query = serde_urlencoded::to_string(&self.params).unwrap_or_default();
            url.push('?');
            url.push_str(&query);
        }
        url
    }

    /// Render the attribute value.
    pub fn build(&self) -> String {
        let mut filters = Vec::new();
        if let Some(include) = &self.include {
            filters.push(format!("include: {include}"));
        }
        if let Some(exclude) = &self.exclude {
            filters.push(format!("exclude: {exclude}"));
        }

        let options = if filters.is_empty() {
            String::new()
        } else {
            format!("filterSignals: {{{}}}", filters.join(", "))
        };

        format!(
            "{}('{}', {{{}}})",
            self.method.action(),
            self.url().replace('\'', "%27"),
            options
        )
    }
}

impl std::fmt::Display for RpcAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.build())
    }
}
