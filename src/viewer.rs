//! A standalone HTML document that opens a model in the Trimble Connect 3D
//! viewer.
//!
//! The document embeds the access token, so treat the rendered output with the
//! same care as the token itself. Hosts that load it into an iframe sandboxed
//! without `allow-same-origin` will see the viewer fail to start, since it
//! needs storage access. Nothing in the document can work around that.

use crate::{error::Error, token::AccessToken};

/// The name to suggest when offering the document as a download
pub const VIEWER_FILE_NAME: &str = "trimble_connect_viewer.html";

const WORKSPACE_API_SCRIPT: &str =
    "https://components.connect.trimble.com/trimble-connect-workspace-api/index.js";

/// How long the workspace API waits for the embedded app to connect, in ms
const CONNECT_TIMEOUT_MS: u32 = 30_000;

const TEMPLATE: &str = r#"<!doctype html>
<html>
  <head>
    <meta charset="utf-8" />
    <title>Trimble Connect Viewer</title>
    <style>
      html, body { margin: 0; padding: 0; height: 100%; width: 100%; overflow: hidden; }
      #tc-viewer { border: 0; width: 100%; height: 100%; }
    </style>
    <script src="{{script}}"></script>
  </head>
  <body>
    <iframe id="tc-viewer" src="about:blank" allowfullscreen></iframe>
    <script>
      const ACCESS_TOKEN = {{token}};
      const PROJECT_ID = {{project}};
      const MODEL_ID = {{model}};
      const VERSION_ID = {{version}};

      (async function () {
        try {
          const iframe = document.getElementById("tc-viewer");
          iframe.src = TrimbleConnectWorkspace.getConnectEmbedUrl();

          const api = await TrimbleConnectWorkspace.connect(
            iframe,
            function (event, data) { console.log("TC event:", event, data); },
            {{connect_timeout}}
          );

          await api.embed.setTokens({ accessToken: ACCESS_TOKEN });

          const config = { projectId: PROJECT_ID, modelId: MODEL_ID };
          if (VERSION_ID) {
            config.versionId = VERSION_ID;
          }

          await api.embed.init3DViewer(config);
        } catch (e) {
          console.error("Error initializing Trimble viewer:", e);
          alert("Failed to initialize Trimble Connect viewer. Check console.");
        }
      })();
    </script>
  </body>
</html>
"#;

/// Everything needed to open a single model in the viewer
#[derive(Clone, Debug)]
pub struct ViewerDocument<'a> {
    pub access_token: &'a AccessToken,
    pub project_id: &'a str,
    pub model_id: &'a str,
    /// Opens the latest version if not set
    pub version_id: Option<&'a str>,
}

impl<'a> ViewerDocument<'a> {
    pub fn new(access_token: &'a AccessToken, project_id: &'a str, model_id: &'a str) -> Self {
        Self {
            access_token,
            project_id,
            model_id,
            version_id: None,
        }
    }

    pub fn version(mut self, version_id: &'a str) -> Self {
        self.version_id = Some(version_id);
        self
    }

    /// Renders the complete HTML document
    pub fn render(&self) -> Result<String, Error> {
        let mut html = String::with_capacity(TEMPLATE.len() + 512);
        let mut rest = TEMPLATE;

        // Single pass, so a value that happens to contain a placeholder is
        // left alone
        while let Some(start) = rest.find("{{") {
            html.push_str(&rest[..start]);
            rest = &rest[start..];

            let end = match rest.find("}}") {
                Some(end) => end + 2,
                None => break,
            };

            match &rest[2..end - 2] {
                "script" => html.push_str(WORKSPACE_API_SCRIPT),
                "connect_timeout" => html.push_str(&CONNECT_TIMEOUT_MS.to_string()),
                "token" => html.push_str(&script_string(self.access_token.secret())?),
                "project" => html.push_str(&script_string(self.project_id)?),
                "model" => html.push_str(&script_string(self.model_id)?),
                "version" => html.push_str(&script_string(self.version_id.unwrap_or_default())?),
                _ => html.push_str(&rest[..end]),
            }

            rest = &rest[end..];
        }

        html.push_str(rest);
        Ok(html)
    }
}

/// A JSON string literal is a valid JS string literal, the only thing left to
/// guard against is the value closing the surrounding script element
fn script_string(value: &str) -> Result<String, Error> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn embeds_values() {
        let token = AccessToken::new("tok").unwrap();
        let html = ViewerDocument::new(&token, "GUiM8Tk3nTo", "ETNppTylU6c")
            .render()
            .unwrap();

        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains(r#"const ACCESS_TOKEN = "tok";"#));
        assert!(html.contains(r#"const PROJECT_ID = "GUiM8Tk3nTo";"#));
        assert!(html.contains(r#"const MODEL_ID = "ETNppTylU6c";"#));
        assert!(html.contains(r#"const VERSION_ID = "";"#));
        assert!(html.contains(WORKSPACE_API_SCRIPT));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn version_is_optional() {
        let token = AccessToken::new("tok").unwrap();
        let html = ViewerDocument::new(&token, "p", "m")
            .version("v7")
            .render()
            .unwrap();

        assert!(html.contains(r#"const VERSION_ID = "v7";"#));
    }

    #[test]
    fn values_cant_escape_the_script() {
        let token = AccessToken::new("tok").unwrap();
        let html = ViewerDocument::new(&token, "\"; alert(1); \"", "</script><b>")
            .render()
            .unwrap();

        assert!(html.contains(r#"const PROJECT_ID = "\"; alert(1); \"";"#));
        assert!(html.contains(r#"const MODEL_ID = "<\/script><b>";"#));
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn placeholders_in_values_are_kept() {
        let token = AccessToken::new("{{project}}").unwrap();
        let html = ViewerDocument::new(&token, "p", "m").render().unwrap();

        assert!(html.contains(r#"const ACCESS_TOKEN = "{{project}}";"#));
    }
}
