//! Subfield name catalogs (`spec.md` §6), bit-exact for compatibility with
//! hosts that validate template fields before a reader exists for them.
//!
//! These are data only: no audio/PDF/DOCX decoding lives here or anywhere
//! in this crate (`spec.md` §1 Non-goals). A host writing a real `audio`/
//! `pdf`/`docx` provider can check a requested subfield against the
//! matching set before doing any work, and a template linter can validate
//! a field name without a registry at all.

pub static AUDIO_SUBFIELDS: phf::Set<&'static str> = phf_set! {
    "album",
    "albumartist",
    "artist",
    "audio_offset",
    "bitrate",
    "comment",
    "composer",
    "disc",
    "disc_total",
    "duration",
    "genre",
    "samplerate",
    "title",
    "track",
    "track_total",
    "year",
    "filesize",
};

pub static PDF_SUBFIELDS: phf::Set<&'static str> = phf_set! {
    "author",
    "creator",
    "producer",
    "created",
    "modified",
    "subject",
    "title",
    "keywords",
};

pub static DOCX_SUBFIELDS: phf::Set<&'static str> = phf_set! {
    "author",
    "category",
    "comments",
    "content_status",
    "created",
    "identifier",
    "keywords",
    "language",
    "last_modified_by",
    "last_printed",
    "modified",
    "revision",
    "subject",
    "title",
    "version",
};

/// Chainable filepath attributes (`.name`, `.stem`, `.suffix`, `.parent`).
pub static FILEPATH_ATTRIBUTES: phf::Set<&'static str> = phf_set! {
    "name",
    "stem",
    "suffix",
    "parent",
};

/// The date/time attribute set shared by `created`/`modified`/`accessed`
/// and by the `today`/`now` sticky fields.
pub static DATE_ATTRIBUTES: phf::Set<&'static str> = phf_set! {
    "date",
    "year",
    "yy",
    "month",
    "mon",
    "mm",
    "dd",
    "dow",
    "doy",
    "hour",
    "min",
    "sec",
    "strftime",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_catalog_matches_spec() {
        assert!(AUDIO_SUBFIELDS.contains("albumartist"));
        assert!(!AUDIO_SUBFIELDS.contains("nonexistent"));
    }

    #[test]
    fn filepath_attributes_cover_chainable_set() {
        for attr in &["name", "stem", "suffix", "parent"] {
            assert!(FILEPATH_ATTRIBUTES.contains(attr));
        }
    }
}
