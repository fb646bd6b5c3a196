//! In-memory stand-ins for the distribution server and the package manager.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, TimeZone, Utc};
use stack_core::catalog::ProductCatalog;
use stack_core::error::{FetchError, InstallationError};
use stack_core::install::InstallDriver;
use stack_core::remote::{CatalogTransport, RemoteCatalog, TransportResponse};

pub const PKGROOT: &str = "https://eups.example.org/stack/src";

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Serves canned responses keyed by URL.
#[derive(Default)]
pub struct FakeTransport {
    responses: HashMap<String, TransportResponse>,
    index_rows: Vec<String>,
    requests: std::cell::RefCell<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&mut self, url: &str, body: &str, last_modified: Option<&str>) {
        self.responses.insert(
            url.to_string(),
            TransportResponse {
                body: body.to_string(),
                last_modified: last_modified.map(str::to_string),
            },
        );
    }

    /// Publish `tag` under [`PKGROOT`] and list it in the tag index.
    pub fn with_tag(mut self, tag: &str, last_modified: &str, entries: &[(&str, &str)]) -> Self {
        let mut body = format!("EUPS distribution {tag} version list. Version 1.0\n");
        body.push_str("#name flavor version\n");
        for (product, version) in entries {
            body.push_str(&format!("{product} generic {version}\n"));
        }
        self.serve(
            &format!("{PKGROOT}/tags/{tag}.list"),
            &body,
            Some(last_modified),
        );

        self.index_rows
            .push(format!("<tr><td><a href=\"{tag}.list\">{tag}.list</a></td></tr>"));
        let index = format!(
            "<html><body><table>\n{}\n</table></body></html>\n",
            self.index_rows.join("\n")
        );
        self.serve(&format!("{PKGROOT}/tags"), &index, None);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl CatalogTransport for FakeTransport {
    fn get(&self, url: &str) -> Result<TransportResponse, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Calls observed by [`FakeDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Install { product: String, tag: Option<String> },
    Declare { product: String, version: String, tag: String },
    Register(String),
}

/// Package manager that installs from a fixed set of releases.
#[derive(Debug, Default)]
pub struct FakeDriver {
    /// What each release tag installs when requested
    releases: BTreeMap<String, Vec<(String, String)>>,
    installed: ProductCatalog,
    declared: BTreeSet<String>,
    failing: BTreeSet<String>,
    pub calls: Vec<Call>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs of `tag` will put every remote `(product, version)` in place.
    pub fn with_releases_from(mut self, remote: &RemoteCatalog) -> Self {
        for (tag, _) in remote.tags_by_date() {
            self.releases
                .insert(tag.to_string(), remote.products_tagged(tag));
        }
        self
    }

    pub fn with_installed(mut self, product: &str, version: &str, tags: &[&str]) -> Self {
        self.installed.insert(product, version, None);
        for tag in tags {
            self.installed.insert(product, version, Some(tag));
        }
        self
    }

    pub fn with_declared(mut self, tag: &str) -> Self {
        self.declared.insert(tag.to_string());
        self
    }

    pub fn failing(mut self, tag: &str) -> Self {
        self.failing.insert(tag.to_string());
        self
    }

    pub fn installed(&self) -> &ProductCatalog {
        &self.installed
    }

    pub fn installs(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Install { tag, .. } => tag.clone(),
                _ => None,
            })
            .collect()
    }

    pub fn declarations(&self, tag: &str) -> Vec<(String, String)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Declare {
                    product,
                    version,
                    tag: t,
                } if t == tag => Some((product.clone(), version.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn mutations(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| !matches!(call, Call::Register(_)))
            .count()
    }
}

fn failure(command: String) -> InstallationError {
    InstallationError::Spawn {
        command,
        source: std::io::Error::other("simulated failure"),
    }
}

impl InstallDriver for FakeDriver {
    fn read_inventory(&self) -> Result<ProductCatalog, InstallationError> {
        Ok(self.installed.clone())
    }

    fn install_distribution(
        &mut self,
        product: &str,
        _version: Option<&str>,
        tag: Option<&str>,
    ) -> Result<(), InstallationError> {
        self.calls.push(Call::Install {
            product: product.to_string(),
            tag: tag.map(str::to_string),
        });
        let tag = tag.unwrap_or_default();
        if self.failing.contains(tag) {
            return Err(failure(format!("eups distrib install {product} -t {tag}")));
        }
        let entries = self
            .releases
            .get(tag)
            .ok_or_else(|| failure(format!("unknown tag {tag}")))?;
        for (product, version) in entries {
            self.installed.insert(product, version, None);
        }
        Ok(())
    }

    fn declare_tag(
        &mut self,
        product: &str,
        version: &str,
        tag: &str,
    ) -> Result<(), InstallationError> {
        self.calls.push(Call::Declare {
            product: product.to_string(),
            version: version.to_string(),
            tag: tag.to_string(),
        });
        self.installed
            .move_tag(product, version, tag)
            .map_err(|err| failure(err.to_string()))
    }

    fn register_global_tag(&mut self, tag: &str) -> Result<(), InstallationError> {
        self.calls.push(Call::Register(tag.to_string()));
        self.declared.insert(tag.to_string());
        Ok(())
    }

    fn list_declared_tags(&self) -> Result<BTreeSet<String>, InstallationError> {
        Ok(self.declared.clone())
    }
}

/// Variable naming the state directory of [`fake_eups`].
pub const FAKE_EUPS_STATE: &str = "FAKE_EUPS_STATE";

const FAKE_EUPS_SCRIPT: &str = r#"#!/bin/sh
state="$FAKE_EUPS_STATE"
echo "$*" >> "$state/log"
[ "$1" = "--nolocks" ] && shift
case "$1" in
  list)
    cat "$state/inventory" 2>/dev/null
    ;;
  tags)
    cat "$state/tags" 2>/dev/null
    ;;
  distrib)
    tag=""
    while [ $# -gt 0 ]; do
      [ "$1" = "-t" ] && tag="$2"
      shift
    done
    if [ ! -f "$state/releases/$tag" ]; then
      echo "distrib: no release tagged $tag" >&2
      exit 3
    fi
    echo "Installing $tag"
    cat "$state/releases/$tag" >> "$state/inventory"
    ;;
  declare)
    echo "$4|$5|$3" >> "$state/inventory"
    ;;
  *)
    echo "eups: unknown command $1" >&2
    exit 2
    ;;
esac
"#;

/// Path to a shell stand-in for `eups`, written once per test binary.
///
/// The script keeps its inventory, declared tags and release contents under
/// the directory named by [`FAKE_EUPS_STATE`], and logs its arguments there.
#[cfg(unix)]
pub fn fake_eups() -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;
    use std::sync::OnceLock;

    static BIN: OnceLock<tempfile::TempDir> = OnceLock::new();
    let dir = BIN.get_or_init(|| {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("eups");
        std::fs::write(&path, FAKE_EUPS_SCRIPT).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        dir
    });
    dir.path().join("eups")
}

/// State directory for one [`fake_eups`] session.
pub struct EupsState {
    pub dir: tempfile::TempDir,
}

impl EupsState {
    pub fn new() -> Self {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("releases")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }

    pub fn with_inventory(self, lines: &[&str]) -> Self {
        self.write("inventory", lines);
        self
    }

    pub fn with_tags(self, tags: &[&str]) -> Self {
        self.write("tags", tags);
        self
    }

    /// Installing `tag` adds each `(product, version)` untagged.
    pub fn with_release(self, tag: &str, entries: &[(&str, &str)]) -> Self {
        let lines: Vec<String> = entries
            .iter()
            .map(|(product, version)| format!("{product}|{version}|"))
            .collect();
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        self.write(&format!("releases/{tag}"), &lines);
        self
    }

    /// Argument lines the script was invoked with, in order.
    pub fn log(&self) -> Vec<String> {
        std::fs::read_to_string(self.path().join("log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn write(&self, name: &str, lines: &[&str]) {
        let mut content = lines.join("\n");
        content.push('\n');
        std::fs::write(self.path().join(name), content).unwrap();
    }
}
