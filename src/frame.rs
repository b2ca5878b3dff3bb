//! Description of the hidden frame that hosts the bundler.
//!
//! Hosts (the `web` module in the browser, the wry webview natively)
//! create the actual element from a [`FrameSpec`].

/// `sandbox` tokens granted to the bundler frame.
pub const FRAME_SANDBOX: &str = "allow-forms allow-scripts allow-same-origin \
                                 allow-modals allow-popups allow-presentation";

/// `allow` (permissions policy) list granted to the bundler frame.
pub const FRAME_ALLOW: &str =
    "geolocation; microphone; camera; midi; encrypted-media";

/// Inline style that keeps the frame out of layout and invisible.
pub const HIDDEN_FRAME_STYLE: &str = "width: 0; height: 0; border: 0; \
                                      outline: 0; position: absolute; \
                                      visibility: hidden;";

/// Inline style for a frame that fills its host (native viewer).
pub const FILL_FRAME_STYLE: &str = "width: 100%; height: 100%; border: 0; \
                                    position: absolute; inset: 0;";

/// Attributes of the frame element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    /// Bundler page URL.
    pub src: String,
    /// Accessible title.
    pub title: String,
    /// Inline style.
    pub style: String,
    /// `sandbox` attribute.
    pub sandbox: String,
    /// `allow` attribute.
    pub allow: String,
}

impl FrameSpec {
    /// The zero-size, absolutely positioned frame the provider mounts.
    #[must_use]
    pub fn hidden(bundler_url: &str) -> Self {
        Self {
            src: bundler_url.to_owned(),
            title: "Sandbox Preview".to_owned(),
            style: HIDDEN_FRAME_STYLE.to_owned(),
            sandbox: FRAME_SANDBOX.to_owned(),
            allow: FRAME_ALLOW.to_owned(),
        }
    }

    /// Same frame, but filling its host instead of hidden.
    #[must_use]
    pub fn filling(mut self) -> Self {
        self.style = FILL_FRAME_STYLE.to_owned();
        self
    }

    /// Attribute name/value pairs in a stable order.
    #[must_use]
    pub fn attributes(&self) -> [(&'static str, &str); 5] {
        [
            ("src", self.src.as_str()),
            ("title", self.title.as_str()),
            ("style", self.style.as_str()),
            ("sandbox", self.sandbox.as_str()),
            ("allow", self.allow.as_str()),
        ]
    }

    /// Render an `<iframe>` tag with `id`.
    #[must_use]
    pub fn to_html(&self, id: &str) -> String {
        let attrs: String = self
            .attributes()
            .iter()
            .map(|(name, value)| format!(" {name}=\"{}\"", escape_attr(value)))
            .collect();
        format!("<iframe id=\"{}\"{attrs}></iframe>", escape_attr(id))
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_frame_is_zero_size() {
        let spec = FrameSpec::hidden("https://bundler.test/");
        assert!(spec.style.contains("width: 0"));
        assert!(spec.style.contains("position: absolute"));
        assert!(spec.sandbox.split(' ').any(|t| t == "allow-scripts"));
    }

    #[test]
    fn filling_frame_keeps_sandbox() {
        let spec = FrameSpec::hidden("https://bundler.test/").filling();
        assert_eq!(spec.style, FILL_FRAME_STYLE);
        assert_eq!(spec.sandbox, FRAME_SANDBOX);
    }

    #[test]
    fn html_escapes_attribute_values() {
        let spec = FrameSpec::hidden("https://bundler.test/?a=1&b=\"2\"");
        let html = spec.to_html("frame");
        assert!(html.starts_with("<iframe id=\"frame\" src="));
        assert!(html.contains("a=1&amp;b=&quot;2&quot;"));
        assert!(html.ends_with("></iframe>"));
    }
}
