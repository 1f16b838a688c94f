//! Server-kind publishing policy.
//!
//! Each server kind wraps a compiled service for the flat bundle in its own
//! way: SAS Viya streams the text straight into a fileref, SAS 9 ships it as
//! a Base64 payload that is decoded on the server before publishing.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::builder::render::{chunk, put_lines, MAX_LINE_WIDTH};
use crate::core::target::ServerKind;

/// Publishes compiled services on one kind of server.
pub trait Publisher: Send + Sync {
    /// File name of the macro providing the publish primitive.
    fn publish_macro(&self) -> &'static str;

    /// Render the statements that recreate `compiled` and publish it as `name`.
    fn wrap_service(&self, name: &str, compiled: &str) -> String;
}

/// SAS Viya: raw text, published with `mv_createwebservice`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViyaPublisher;

impl Publisher for ViyaPublisher {
    fn publish_macro(&self) -> &'static str {
        "mv_createwebservice.sas"
    }

    fn wrap_service(&self, name: &str, compiled: &str) -> String {
        format!(
            "%let service={name};\n\
             filename sascode temp lrecl=32767;\n\
             data _null_;\n\
             file sascode;\n\
             {}run;\n\
             %mv_createwebservice(path=&appLoc/&path, name=&service, code=sascode, replace=yes)\n\
             filename sascode clear;\n",
            put_lines(compiled)
        )
    }
}

/// SAS 9: Base64 payload, published with `mm_createwebservice`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sas9Publisher;

impl Sas9Publisher {
    /// Encode `compiled` as `put` lines of at most one chunk width.
    fn encoded_lines(compiled: &str) -> String {
        let encoded = BASE64.encode(compiled.as_bytes());
        chunk(&encoded, MAX_LINE_WIDTH)
            .into_iter()
            .filter(|piece| !piece.is_empty())
            .map(|piece| format!(" put '{}';\n", piece))
            .collect()
    }
}

impl Publisher for Sas9Publisher {
    fn publish_macro(&self) -> &'static str {
        "mm_createwebservice.sas"
    }

    // Chunks are a multiple of four characters wide, so every line decodes
    // on its own.
    fn wrap_service(&self, name: &str, compiled: &str) -> String {
        format!(
            "%let service={name};\n\
             filename sascd64 temp lrecl=32767;\n\
             data _null_;\n\
             file sascd64;\n\
             {}run;\n\
             filename sascode temp lrecl=32767;\n\
             data _null_;\n\
             infile sascd64 lrecl=32767 truncover;\n\
             file sascode recfm=n;\n\
             input line $char32767.;\n\
             length enc decoded $32767;\n\
             enc=strip(line);\n\
             len=length(enc)/4*3-countc(enc,'=');\n\
             decoded=input(enc,$base64x32767.);\n\
             put decoded $varying32767. len;\n\
             run;\n\
             %mm_createwebservice(path=&appLoc/&path, name=&service, code=sascode, replace=yes)\n\
             filename sascode clear;\n\
             filename sascd64 clear;\n",
            Self::encoded_lines(compiled)
        )
    }
}

static VIYA: ViyaPublisher = ViyaPublisher;
static SAS9: Sas9Publisher = Sas9Publisher;

/// The publisher for a server kind.
pub fn publisher_for(kind: ServerKind) -> &'static dyn Publisher {
    match kind {
        ServerKind::SasViya => &VIYA,
        ServerKind::Sas9 => &SAS9,
    }
}

impl ServerKind {
    /// The publisher for this server kind.
    pub fn publisher(self) -> &'static dyn Publisher {
        publisher_for(self)
    }
}
