//! Inbound request model.

use crate::directive::parse_directives;
use crate::error::RenderError;
use crate::trace::Trace;
use crate::types::RenderOptions;

/// Scheme every content identifier starts with.
pub const IDENTIFIER_SCHEME: &str = "mgid:";

/// How the identifier in a request is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `/uri/`: the identifier names the origin asset directly
    Direct,
    /// `/oid/`: the identifier names a content item resolved via metadata
    Identifier,
}

impl RequestKind {
    /// Route prefix, always five characters.
    pub fn prefix(&self) -> &'static str {
        match self {
            RequestKind::Direct => "/uri/",
            RequestKind::Identifier => "/oid/",
        }
    }
}

/// One parsed render request.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub kind: RequestKind,
    /// Full request path, used as the result-cache key
    pub path: String,
    /// Asset path or content-item identifier
    pub identifier: String,
    pub options: RenderOptions,
    /// Raw `Accept` header, consulted for format negotiation
    pub accept: Option<String>,
    /// Bypass result and metadata caches and re-fetch the mirror
    pub force_refresh: bool,
    pub trace: Trace,
}

impl RenderRequest {
    /// Parse the path segment that follows the route prefix.
    pub fn parse(kind: RequestKind, segment: &str, trace: Trace) -> Result<Self, RenderError> {
        let (directives, identifier) = match segment.find(IDENTIFIER_SCHEME) {
            Some(0) => ("", segment),
            Some(_) => match segment.split_once('/') {
                Some((directives, identifier)) => (directives, identifier),
                None => return Err(RenderError::InvalidRequest(segment.to_string())),
            },
            None => return Err(RenderError::InvalidRequest(segment.to_string())),
        };

        if identifier.is_empty() {
            return Err(RenderError::InvalidRequest(segment.to_string()));
        }

        trace.note(format!(
            "request {}{segment}: identifier={identifier} directives={directives}",
            kind.prefix()
        ));
        let options = parse_directives(directives, identifier, &trace);

        Ok(Self {
            kind,
            path: format!("{}{segment}", kind.prefix()),
            identifier: identifier.to_string(),
            options,
            accept: None,
            force_refresh: false,
            trace,
        })
    }

    /// Parse a full path beginning with `/uri/` or `/oid/`.
    pub fn from_path(path: &str, trace: Trace) -> Result<Self, RenderError> {
        let kind = [RequestKind::Direct, RequestKind::Identifier]
            .into_iter()
            .find(|kind| path.starts_with(kind.prefix()))
            .ok_or_else(|| RenderError::InvalidRequest(path.to_string()))?;
        Self::parse(kind, &path[kind.prefix().len()..], trace)
    }

    pub fn with_accept(mut self, accept: Option<String>) -> Self {
        self.accept = accept;
        self
    }

    pub fn with_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_without_directives() {
        let req = RenderRequest::parse(
            RequestKind::Direct,
            "mgid:file:gsp:assets:/cc/images/a.jpg",
            Trace::discard(),
        )
        .unwrap();
        assert_eq!(req.identifier, "mgid:file:gsp:assets:/cc/images/a.jpg");
        assert_eq!(req.options, RenderOptions::default());
        assert_eq!(req.path, "/uri/mgid:file:gsp:assets:/cc/images/a.jpg");
    }

    #[test]
    fn test_directives_before_first_slash() {
        let req = RenderRequest::parse(
            RequestKind::Identifier,
            "rw=480:rh=320:q=50/mgid:arc:video:example.com:1234",
            Trace::discard(),
        )
        .unwrap();
        assert_eq!(req.identifier, "mgid:arc:video:example.com:1234");
        assert_eq!(req.options.resize_width, 480);
        assert_eq!(req.options.quality, 50);
        assert_eq!(
            req.path,
            "/oid/rw=480:rh=320:q=50/mgid:arc:video:example.com:1234"
        );
    }

    #[test]
    fn test_missing_scheme_is_invalid() {
        let err = RenderRequest::parse(RequestKind::Direct, "rw=10/file.jpg", Trace::discard())
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidRequest(_)));
    }

    #[test]
    fn test_from_path_dispatches_on_prefix() {
        let req = RenderRequest::from_path("/oid/mgid:arc:video:ns:id", Trace::discard()).unwrap();
        assert_eq!(req.kind, RequestKind::Identifier);

        let req = RenderRequest::from_path("/uri/q=0.5/mgid:file:a.png", Trace::discard()).unwrap();
        assert_eq!(req.kind, RequestKind::Direct);
        assert_eq!(req.options.quality, 50);

        assert!(RenderRequest::from_path("/img/mgid:file:a.png", Trace::discard()).is_err());
    }

    #[test]
    fn test_builders() {
        let req = RenderRequest::from_path("/uri/mgid:file:a.png", Trace::discard())
            .unwrap()
            .with_accept(Some("image/webp,*/*".to_string()))
            .with_refresh(true);
        assert!(req.force_refresh);
        assert_eq!(req.accept.as_deref(), Some("image/webp,*/*"));
    }
}
