//! Testing utilities for covwire workspace
//!
//! In-memory collaborators and descriptor fixtures.

#![allow(missing_docs)]

use std::collections::{BTreeMap, VecDeque};

use covwire_core::{
    CommandLine, CoverageConfig, CoverageSetup, DocumentStore, ExternalConfigStore, MergeError,
    MergeResult, ProcessRunner, ProjectDescriptor,
};

/// Descriptor with two unrelated profiles and a regular build section
pub const SAMPLE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <modelVersion>4.0.0</modelVersion>
    <groupId>com.test</groupId>
    <artifactId>demo</artifactId>
    <version>1.0.0-SNAPSHOT</version>
    <!-- managed by hand -->
    <build>
        <plugins>
            <plugin>
                <artifactId>maven-compiler-plugin</artifactId>
                <version>2.3.2</version>
                <configuration>
                    <source>1.6</source>
                    <target>1.6</target>
                </configuration>
            </plugin>
        </plugins>
    </build>
    <profiles>
        <profile>
            <id>arq-jbossas-managed</id>
            <dependencies>
                <dependency>
                    <groupId>org.jboss.as</groupId>
                    <artifactId>jboss-as-arquillian-container-managed</artifactId>
                    <scope>test</scope>
                </dependency>
            </dependencies>
        </profile>
        <profile>
            <id>release</id>
            <activation>
                <property>
                    <name>performRelease</name>
                </property>
            </activation>
        </profile>
    </profiles>
</project>
"#;

/// Descriptor without a `<profiles>` section
pub const BARE_POM: &str =
    "<project><modelVersion>4.0.0</modelVersion><artifactId>bare</artifactId></project>";

/// Freshly scaffolded container document with no children
pub const EMPTY_ARQUILLIAN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<arquillian></arquillian>
"#;

/// Container document with one unrelated container
pub const ARQUILLIAN_WITH_CONTAINER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<arquillian xmlns="http://jboss.org/schema/arquillian">
    <engine>
        <property name="deploymentExportPath">target/</property>
    </engine>
    <container qualifier="jbossas-managed" default="true">
        <configuration>
            <property name="jbossHome">/opt/jboss</property>
        </configuration>
    </container>
</arquillian>
"#;

/// Descriptor held as text, reparsed on every load
#[derive(Debug, Clone)]
pub struct MemoryDocumentStore {
    pub text: String,
    pub saves: usize,
}

impl MemoryDocumentStore {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            saves: 0,
        }
    }

    pub fn descriptor(&self) -> ProjectDescriptor {
        ProjectDescriptor::parse(&self.text).unwrap()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self) -> MergeResult<ProjectDescriptor> {
        Ok(ProjectDescriptor::parse(&self.text)?)
    }

    fn save(&mut self, descriptor: &ProjectDescriptor) -> MergeResult<()> {
        self.text = descriptor.to_markup();
        self.saves += 1;
        Ok(())
    }
}

/// Named documents in memory; every write is recorded
#[derive(Debug, Clone, Default)]
pub struct MemoryExternalConfigStore {
    pub files: BTreeMap<String, String>,
    pub writes: Vec<String>,
}

impl MemoryExternalConfigStore {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_file(name: &str, text: &str) -> Self {
        let mut store = Self::default();
        store.files.insert(name.to_string(), text.to_string());
        store
    }

    pub fn file(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }
}

impl ExternalConfigStore for MemoryExternalConfigStore {
    type Handle = String;

    fn locate(&self, name: &str) -> MergeResult<Option<String>> {
        Ok(self.files.contains_key(name).then(|| name.to_string()))
    }

    fn read(&self, handle: &String) -> MergeResult<String> {
        self.files.get(handle).cloned().ok_or_else(|| {
            MergeError::io_error(
                handle.as_str(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such document"),
            )
        })
    }

    fn write(&mut self, handle: &String, text: &str) -> MergeResult<()> {
        self.files.insert(handle.clone(), text.to_string());
        self.writes.push(handle.clone());
        Ok(())
    }
}

/// Records every command; exit codes are replayed in order, then 0
#[derive(Debug, Clone, Default)]
pub struct RecordingRunner {
    pub commands: Vec<CommandLine>,
    pub exit_codes: VecDeque<i32>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_with(code: i32) -> Self {
        Self {
            commands: Vec::new(),
            exit_codes: VecDeque::from([code]),
        }
    }

    pub fn rendered(&self) -> Vec<String> {
        self.commands.iter().map(ToString::to_string).collect()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&mut self, command: &CommandLine) -> MergeResult<i32> {
        self.commands.push(command.clone());
        Ok(self.exit_codes.pop_front().unwrap_or(0))
    }
}

pub type MemorySetup = CoverageSetup<MemoryDocumentStore, MemoryExternalConfigStore>;

/// Setup over [`SAMPLE_POM`] and an empty container document
pub fn setup_with_empty_arquillian() -> MemorySetup {
    let config = CoverageConfig::default();
    let external =
        MemoryExternalConfigStore::with_file(&config.external_config_name, EMPTY_ARQUILLIAN);
    CoverageSetup::new(config, MemoryDocumentStore::new(SAMPLE_POM), external)
}

/// Setup over [`SAMPLE_POM`] with no container document at all
pub fn setup_without_arquillian() -> MemorySetup {
    CoverageSetup::new(
        CoverageConfig::default(),
        MemoryDocumentStore::new(SAMPLE_POM),
        MemoryExternalConfigStore::empty(),
    )
}

/// Count profiles whose id matches `id` ignoring case
pub fn count_profiles(descriptor: &ProjectDescriptor, id: &str) -> usize {
    descriptor
        .profile_ids()
        .iter()
        .filter(|p| p.eq_ignore_ascii_case(id))
        .count()
}
