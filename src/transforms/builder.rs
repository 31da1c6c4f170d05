//! Default transform builder.

use axum::http::header::{HeaderName, HeaderValue};

use crate::transforms::{
    RequestTransform, ResponseTransform, TransformBuilder, TransformChain, TransformError,
    TransformSpec,
};

/// Validates transform specs and compiles them into a [`TransformChain`].
#[derive(Debug, Default, Clone)]
pub struct StandardTransformBuilder;

impl StandardTransformBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl TransformBuilder for StandardTransformBuilder {
    fn build(&self, specs: &[TransformSpec]) -> Result<TransformChain, TransformError> {
        let mut request = Vec::new();
        let mut response = Vec::new();

        for spec in specs {
            match spec {
                TransformSpec::PathSet { path } => {
                    request.push(RequestTransform::PathSet(checked_path(path)?));
                }
                TransformSpec::PathPrefix { prefix } => {
                    request.push(RequestTransform::PathPrefix(checked_path(prefix)?));
                }
                TransformSpec::PathRemovePrefix { prefix } => {
                    request.push(RequestTransform::PathRemovePrefix(checked_path(prefix)?));
                }
                TransformSpec::RequestHeader { name, value, append } => {
                    let (name, value) = header_pair(name, value)?;
                    request.push(if *append {
                        RequestTransform::AppendHeader(name, value)
                    } else {
                        RequestTransform::SetHeader(name, value)
                    });
                }
                TransformSpec::RequestHeaderRemove { name } => {
                    request.push(RequestTransform::RemoveHeader(header_name(name)?));
                }
                TransformSpec::ResponseHeader { name, value, append } => {
                    let (name, value) = header_pair(name, value)?;
                    response.push(if *append {
                        ResponseTransform::AppendHeader(name, value)
                    } else {
                        ResponseTransform::SetHeader(name, value)
                    });
                }
            }
        }

        Ok(TransformChain::new(request, response))
    }
}

fn checked_path(path: &str) -> Result<String, TransformError> {
    if path.starts_with('/') {
        Ok(path.to_string())
    } else {
        Err(TransformError::InvalidPath(path.to_string()))
    }
}

fn header_name(name: &str) -> Result<HeaderName, TransformError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| TransformError::InvalidHeaderName(name.to_string()))
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), TransformError> {
    let header = header_name(name)?;
    let value = HeaderValue::from_str(value)
        .map_err(|_| TransformError::InvalidHeaderValue(name.to_string()))?;
    Ok((header, value))
}
