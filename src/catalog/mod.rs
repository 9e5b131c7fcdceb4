//! YAML-described object space
//!
//! A catalog lists enums, interfaces (with a single-parent hierarchy),
//! procedures and live proxies. [`CatalogService`] serves it over the glue
//! protocol.

mod service;

pub use service::CatalogService;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::{
    EnumDescriptor, IfaceDescriptor, ParamDescriptor, ParamKind, ProcDescriptor, PropDescriptor,
    Value,
};
use crate::error::{GlueError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumSpec {
    pub values: Vec<String>,
    #[serde(default)]
    pub blurbs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IfaceSpec {
    pub parent: Option<String>,
    pub methods: Vec<String>,
    pub properties: Vec<PropDescriptor>,
    pub signals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcSpec {
    #[serde(default = "no_return")]
    pub returns: ParamDescriptor,
    #[serde(default)]
    pub params: Vec<ParamDescriptor>,
    /// Fixed value handed back by `exec`
    #[serde(default)]
    pub result: Option<Value>,
}

fn no_return() -> ParamDescriptor {
    ParamDescriptor::returns(ParamKind::None)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub base: String,
    #[serde(default)]
    pub enums: BTreeMap<String, EnumSpec>,
    #[serde(default)]
    pub ifaces: BTreeMap<String, IfaceSpec>,
    #[serde(default)]
    pub procs: BTreeMap<String, ProcSpec>,
    /// Object handle -> interface name
    #[serde(default)]
    pub proxies: BTreeMap<u64, String>,
}

impl Catalog {
    /// Parse and validate a catalog document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let catalog: Self = serde_yaml::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let catalog = Self::from_yaml(&content)?;
        log::info!(
            "Loaded catalog from {}: {} ifaces, {} procs, {} proxies",
            path.as_ref().display(),
            catalog.ifaces.len(),
            catalog.procs.len(),
            catalog.proxies.len()
        );
        Ok(catalog)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.ifaces.contains_key(&self.base) {
            return Err(GlueError::Catalog(format!(
                "base iface `{}` is not declared",
                self.base
            )));
        }

        for (name, iface) in &self.ifaces {
            if let Some(parent) = &iface.parent {
                if !self.ifaces.contains_key(parent) {
                    return Err(GlueError::Catalog(format!(
                        "iface `{}` has unknown parent `{}`",
                        name, parent
                    )));
                }
            } else if *name != self.base {
                return Err(GlueError::Catalog(format!(
                    "iface `{}` has no parent and is not the base iface",
                    name
                )));
            }
            if self.ancestors(name).last() != Some(&self.base) {
                return Err(GlueError::Catalog(format!(
                    "iface `{}` does not descend from `{}`",
                    name, self.base
                )));
            }
            if let Some(prop) = iface.properties.iter().find(|p| p.param.name().is_none()) {
                return Err(GlueError::Catalog(format!(
                    "iface `{}` has an unnamed {:?} property",
                    name,
                    prop.param.glue_type()
                )));
            }
        }

        for name in self.enums.keys() {
            if let Some(desc) = self.enum_descriptor(name) {
                desc.validate()?;
            }
        }

        for name in self.procs.keys() {
            if let Some(desc) = self.proc_descriptor(name) {
                desc.validate()?;
            }
        }

        for (proxy, iface) in &self.proxies {
            if *proxy == 0 {
                return Err(GlueError::Catalog("proxy handle 0 is reserved".into()));
            }
            if !self.ifaces.contains_key(iface) {
                return Err(GlueError::Catalog(format!(
                    "proxy {} has unknown iface `{}`",
                    proxy, iface
                )));
            }
        }
        Ok(())
    }

    /// The iface itself followed by its parent chain. Empty for unknown ifaces.
    pub fn ancestors(&self, iface: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = Some(iface.to_string());
        while let Some(name) = current {
            // a cycle can never be longer than the iface table
            if chain.len() > self.ifaces.len() || chain.contains(&name) {
                break;
            }
            let Some(spec) = self.ifaces.get(&name) else {
                break;
            };
            current = spec.parent.clone();
            chain.push(name);
        }
        chain
    }

    /// Specs along the ancestor chain, most derived first.
    fn chain_specs(&self, iface: &str) -> impl Iterator<Item = &IfaceSpec> {
        self.ancestors(iface)
            .into_iter()
            .filter_map(move |name| self.ifaces.get(&name))
    }

    /// Direct subclasses of `iface`.
    pub fn children(&self, iface: &str) -> Vec<String> {
        self.ifaces
            .iter()
            .filter(|(_, spec)| spec.parent.as_deref() == Some(iface))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn enum_descriptor(&self, name: &str) -> Option<EnumDescriptor> {
        self.enums.get(name).map(|spec| EnumDescriptor {
            enum_name: name.to_string(),
            values: spec.values.clone(),
            blurbs: spec.blurbs.clone(),
        })
    }

    /// Property and signal names include inherited ones.
    pub fn iface_descriptor(&self, name: &str) -> Option<IfaceDescriptor> {
        if !self.ifaces.contains_key(name) {
            return None;
        }
        let mut property_names = Vec::new();
        let mut signal_names = Vec::new();
        for spec in self.chain_specs(name) {
            property_names.extend(
                spec.properties
                    .iter()
                    .filter_map(|p| p.param.name().map(str::to_string)),
            );
            signal_names.extend(spec.signals.iter().cloned());
        }
        Some(IfaceDescriptor {
            type_name: name.to_string(),
            ancestor_ifaces: self.ancestors(name),
            property_names,
            signal_names,
        })
    }

    /// Look a property up along the iface's ancestor chain.
    pub fn find_property(&self, iface: &str, prop_name: &str) -> Option<&PropDescriptor> {
        self.chain_specs(iface)
            .flat_map(|spec| spec.properties.iter())
            .find(|p| p.param.name() == Some(prop_name))
    }

    pub fn declares_signal(&self, iface: &str, signal: &str) -> bool {
        self.chain_specs(iface)
            .any(|spec| spec.signals.iter().any(|s| s == signal))
    }

    pub fn proc_descriptor(&self, name: &str) -> Option<ProcDescriptor> {
        self.procs.get(name).map(|spec| ProcDescriptor {
            name: name.to_string(),
            return_param: spec.returns.clone(),
            params: spec.params.clone(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    pub(crate) const SAMPLE: &str = r#"
base: Object
enums:
  Color:
    values: [Red, Green]
    blurbs: [r, g]
ifaces:
  Object:
    properties:
      - param: { name: name, type: str }
        pretty_name: Name
    signals: [notify]
  Item:
    parent: Object
    methods: [rename]
    properties:
      - param: { name: volume, type: int, default: 50, min: 0, max: 100 }
        group: Mixer
    signals: [changed]
  Track:
    parent: Item
procs:
  echo:
    returns: { type: str }
    params:
      - { name: text, type: str }
    result: { type: str, value: hello }
  stop: {}
proxies:
  1: Item
  2: Track
"#;

    #[test]
    fn test_parse_sample() {
        let catalog = Catalog::from_yaml(SAMPLE).unwrap();
        assert_eq!(catalog.base, "Object");
        assert_eq!(catalog.proxies.get(&2).map(String::as_str), Some("Track"));
        assert_eq!(
            catalog.procs["echo"].result,
            Some(Value::string("hello"))
        );
        assert_eq!(catalog.procs["stop"].returns.glue_type(), crate::codec::GlueType::None);
    }

    #[test]
    fn test_ancestors() {
        let catalog = Catalog::from_yaml(SAMPLE).unwrap();
        assert_eq!(catalog.ancestors("Track"), vec!["Track", "Item", "Object"]);
        assert_eq!(catalog.ancestors("Object"), vec!["Object"]);
        assert!(catalog.ancestors("Nope").is_empty());
    }

    #[test]
    fn test_children() {
        let catalog = Catalog::from_yaml(SAMPLE).unwrap();
        assert_eq!(catalog.children("Object"), vec!["Item"]);
        assert!(catalog.children("Track").is_empty());
    }

    #[test]
    fn test_iface_descriptor_includes_inherited() {
        let catalog = Catalog::from_yaml(SAMPLE).unwrap();
        let iface = catalog.iface_descriptor("Item").unwrap();
        assert_eq!(iface.ancestor_ifaces, vec!["Item", "Object"]);
        assert_eq!(iface.property_names, vec!["volume", "name"]);
        assert_eq!(iface.signal_names, vec!["changed", "notify"]);
        assert!(catalog.iface_descriptor("Nope").is_none());
    }

    #[test]
    fn test_find_property_walks_chain() {
        let catalog = Catalog::from_yaml(SAMPLE).unwrap();
        let prop = catalog.find_property("Track", "name").unwrap();
        assert_eq!(prop.pretty_name.as_deref(), Some("Name"));
        assert!(catalog.find_property("Object", "volume").is_none());
    }

    #[test]
    fn test_declares_signal() {
        let catalog = Catalog::from_yaml(SAMPLE).unwrap();
        assert!(catalog.declares_signal("Track", "notify"));
        assert!(!catalog.declares_signal("Object", "changed"));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let err = Catalog::from_yaml("base: A\nifaces:\n  A: {}\n  B: { parent: C }\n").unwrap_err();
        assert!(matches!(err, GlueError::Catalog(_)));
    }

    #[test]
    fn test_cycle_rejected() {
        let text = "base: A\nifaces:\n  A: {}\n  B: { parent: C }\n  C: { parent: B }\n";
        let err = Catalog::from_yaml(text).unwrap_err();
        assert!(err.to_string().contains("does not descend"));
    }

    #[test]
    fn test_missing_base_rejected() {
        assert!(Catalog::from_yaml("base: A\n").is_err());
    }

    #[test]
    fn test_bad_enum_rejected() {
        let text = "base: A\nifaces:\n  A: {}\nenums:\n  E: { values: [x, y], blurbs: [x] }\n";
        let err = Catalog::from_yaml(text).unwrap_err();
        assert!(matches!(err, GlueError::Descriptor(_)));
    }

    #[test]
    fn test_null_proxy_rejected() {
        let text = "base: A\nifaces:\n  A: {}\nproxies:\n  0: A\n";
        assert!(Catalog::from_yaml(text).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.ifaces.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Catalog::load("/nonexistent/catalog.yml").unwrap_err();
        assert!(matches!(err, GlueError::Io(_)));
    }
}
