//! Struts2 endpoint extractor (SPEC_FULL.md §6): reads the `struts.xml`
//! action-mapping descriptor for routes, and the `jsp_files_dir` tree for
//! the forms that submit to them.

use super::{EndpointExtractor, RouteEntry, ViewDescriptor};
use crate::config::ProjectConfig;
use crate::errors::CpgResult;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::path::PathBuf;

pub struct Struts2Extractor {
    struts_xml: Option<PathBuf>,
    jsp_files_dir: Option<PathBuf>,
    route_data: Vec<RouteEntry>,
    view_data: Vec<ViewDescriptor>,
}

impl Struts2Extractor {
    pub fn new(config: &ProjectConfig) -> Self {
        Self {
            struts_xml: config.struts_xml.as_ref().map(PathBuf::from),
            jsp_files_dir: config.jsp_files_dir.as_ref().map(PathBuf::from),
            route_data: Vec::new(),
            view_data: Vec::new(),
        }
    }

    fn parse_struts_xml(&mut self, path: &std::path::Path) -> CpgResult<()> {
        let xml = std::fs::read_to_string(path)?;
        let mut reader = Reader::from_str(&xml);
        reader.config_mut().trim_text(true);

        let mut namespace = String::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    let local = e.local_name();
                    let tag = std::str::from_utf8(local.as_ref()).unwrap_or("");
                    match tag {
                        "package" => {
                            namespace = attr(&e, b"namespace").unwrap_or_default();
                        }
                        "action" => {
                            let name = attr(&e, b"name").unwrap_or_default();
                            let class = attr(&e, b"class").unwrap_or_default();
                            let method = attr(&e, b"method").unwrap_or_else(|| "execute".to_owned());
                            let route = format!(
                                "{}/{}",
                                namespace.trim_end_matches('/'),
                                name.trim_start_matches('/')
                            );
                            self.route_data.push(RouteEntry {
                                class,
                                method,
                                route,
                                params: Vec::new(),
                            });
                        }
                        _ => {}
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
            buf.clear();
        }
        Ok(())
    }

    fn scan_views(&mut self, dir: &std::path::Path) -> CpgResult<()> {
        for entry in ignore::WalkBuilder::new(dir).build() {
            let Ok(entry) = entry else { continue };
            if entry.path().extension().and_then(|e| e.to_str()) != Some("jsp") {
                continue;
            }
            if let Ok(text) = std::fs::read_to_string(entry.path()) {
                if let Some(view) = scan_jsp_form(&text) {
                    self.view_data.push(view);
                }
            }
        }
        Ok(())
    }
}

fn attr(e: &quick_xml::events::BytesStart, key: &[u8]) -> Option<String> {
    e.attributes().flatten().find(|a| a.key.as_ref() == key).map(|a| {
        String::from_utf8_lossy(&a.value).into_owned()
    })
}

/// Extract the first `<form action="...">`/`<s:form action="...">` in a JSP
/// and the `name` attribute of every `<input>`/`<s:textfield>` nested in it.
/// A line-oriented scan rather than a full (X)HTML parse: JSP pages mix
/// scriptlets and custom tags that aren't well-formed XML, so a strict
/// parser would reject most real files.
fn scan_jsp_form(text: &str) -> Option<ViewDescriptor> {
    let form_start = text.find("form action=")?;
    let after = &text[form_start + "form action=".len()..];
    let quote = after.chars().next()?;
    let end = after[1..].find(quote)? + 1;
    let route = after[1..end].to_owned();

    let mut fields = Vec::new();
    for marker in ["input", "textfield", "textarea"] {
        let needle = format!("{marker} name=");
        let mut rest = text;
        while let Some(pos) = rest.find(&needle) {
            let after = &rest[pos + needle.len()..];
            if let Some(q) = after.chars().next() {
                if let Some(e) = after[1..].find(q) {
                    fields.push(after[1..e + 1].to_owned());
                }
            }
            rest = &after[1..];
        }
    }

    Some(ViewDescriptor { route, fields })
}

impl EndpointExtractor for Struts2Extractor {
    fn extract_endpoints(&mut self) -> CpgResult<()> {
        if let Some(path) = self.struts_xml.clone() {
            self.parse_struts_xml(&path)?;
        }
        if let Some(dir) = self.jsp_files_dir.clone() {
            self.scan_views(&dir)?;
        }
        Ok(())
    }

    fn route_data(&self) -> &[RouteEntry] {
        &self.route_data
    }

    fn view_data(&self) -> &[ViewDescriptor] {
        &self.view_data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action_mapping_into_route() {
        let xml = r#"
            <struts>
              <package name="default" namespace="/user">
                <action name="login" class="a.b.LoginAction" method="execute">
                  <result>/success.jsp</result>
                </action>
              </package>
            </struts>
        "#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("struts.xml");
        std::fs::write(&path, xml).unwrap();

        let mut extractor = Struts2Extractor {
            struts_xml: Some(path.clone()),
            jsp_files_dir: None,
            route_data: Vec::new(),
            view_data: Vec::new(),
        };
        extractor.parse_struts_xml(&path).unwrap();

        assert_eq!(extractor.route_data.len(), 1);
        assert_eq!(extractor.route_data[0].class, "a.b.LoginAction");
        assert_eq!(extractor.route_data[0].route, "/user/login");
    }

    #[test]
    fn scans_form_fields_from_jsp() {
        let jsp = r#"<s:form action="/user/login"><input name="username"/><input name="password"/></s:form>"#;
        let view = scan_jsp_form(jsp).unwrap();
        assert_eq!(view.route, "/user/login");
        assert_eq!(view.fields, vec!["username".to_string(), "password".to_string()]);
    }

    #[test]
    fn dump_writes_both_json_files() {
        let extractor = Struts2Extractor {
            struts_xml: None,
            jsp_files_dir: None,
            route_data: vec![RouteEntry {
                class: "a.b.C".into(),
                method: "execute".into(),
                route: "/c".into(),
                params: vec![],
            }],
            view_data: vec![],
        };
        let dir = tempfile::tempdir().unwrap();
        extractor.dump(dir.path()).unwrap();
        assert!(dir.path().join("routeData.json").exists());
        assert!(dir.path().join("viewData.json").exists());
    }
}
