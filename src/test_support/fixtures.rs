//! On-disk project fixtures.
//!
//! Lays out a small but realistic project in a temporary directory: a
//! project macro folder, a bundled library, a program folder, init/term
//! fragments, one service folder and one job folder.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// `sasbuild.toml` of the sample project.
pub const SAMPLE_PROJECT_FILE: &str = r#"[project]
name = "sample"
macro_folders = ["sasjs/macros"]
program_folders = ["sasjs/programs"]
library_folder = "node_modules/@sasjs/core"

[service_config]
init_program = "sasjs/serviceinit.sas"
term_program = "sasjs/serviceterm.sas"

[service_config.vars]
env = "dev"

[[targets]]
name = "viya"
server = "sasviya"
app_loc = "/Public/app/sample"
service_folders = ["sasjs/services/common"]
job_folders = ["sasjs/jobs/extract"]

[[targets]]
name = "sas9"
server = "sas9"
app_loc = "/Shared Data/sample"
service_folders = ["sasjs/services/common"]
"#;

const SAMPLE_FILES: &[(&str, &str)] = &[
    (
        "node_modules/@sasjs/core/base/mf_abort.sas",
        "%macro mf_abort(msg=);\n  %put &msg;\n%mend mf_abort;\n",
    ),
    (
        "node_modules/@sasjs/core/base/mf_getuser.sas",
        "%macro mf_getuser();\n  &sysuserid\n%mend mf_getuser;\n",
    ),
    (
        "node_modules/@sasjs/core/viya/mv_createwebservice.sas",
        "/**\n  <h4> SAS Macros </h4>\n  @li mf_abort.sas\n**/\n%macro mv_createwebservice(path=,name=,code=,replace=);\n%mend mv_createwebservice;\n",
    ),
    (
        "node_modules/@sasjs/core/meta/mm_createwebservice.sas",
        "%macro mm_createwebservice(path=,name=,code=,replace=);\n%mend mm_createwebservice;\n",
    ),
    (
        "sasjs/macros/mf_getuser.sas",
        "%macro mf_getuser();\n  override\n%mend mf_getuser;\n",
    ),
    (
        "sasjs/programs/report.sas",
        "proc print data=sashelp.class;\nrun;\n",
    ),
    ("sasjs/serviceinit.sas", "%put service init;\n"),
    ("sasjs/serviceterm.sas", "%put service term;\n"),
    (
        "sasjs/services/common/appinit.sas",
        "/**\n  @file appinit.sas\n  @brief Returns the user\n\n  <h4> SAS Macros </h4>\n  @li mf_getuser.sas\n  @li mf_abort.sas\n\n  <h4> SAS Programs </h4>\n  @li report.sas rpt\n\n**/\n%put %mf_getuser();\n",
    ),
    (
        "sasjs/services/common/admin/health.sas",
        "%put ok;\n",
    ),
    (
        "sasjs/jobs/extract/nightly.sas",
        "/**\n  <h4> SAS Macros </h4>\n  @li mf_abort.sas\n**/\n%mf_abort(msg=done)\n",
    ),
];

/// A sample project written to a temporary directory.
pub struct SampleProject {
    dir: TempDir,
}

impl SampleProject {
    /// Write the sample project to a fresh temporary directory.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let project = SampleProject { dir };
        project.write("sasbuild.toml", SAMPLE_PROJECT_FILE);
        for (path, content) in SAMPLE_FILES {
            project.write(path, content);
        }
        project
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the project file.
    pub fn project_file(&self) -> PathBuf {
        self.root().join("sasbuild.toml")
    }

    /// Write (or overwrite) a file relative to the project root.
    pub fn write(&self, relative: &str, content: &str) {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// Read a file relative to the project root.
    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.root().join(relative)).unwrap()
    }
}

impl Default for SampleProject {
    fn default() -> Self {
        Self::new()
    }
}
