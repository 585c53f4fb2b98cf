//! Conversion eligibility: whether a file should be submitted now.
//!
//! A file is submitted at most once per lifecycle. Anything past `none`
//! (in flight, finished, or failed) is left alone until an explicit reset
//! puts it back to `none`.

use crate::pipeline::classify::is_convertible;
use crate::record::FileRecord;
use crate::step::ConversionStep;

/// `true` iff the file's extension is convertible and it was never attempted.
pub fn should_convert(file: &FileRecord) -> bool {
    file.conversion_step == ConversionStep::None && is_convertible(&file.file_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_pptx_should_convert() {
        let f = FileRecord::new("l1", "https://cdn.example.com/lecture.pptx");
        assert!(should_convert(&f));
    }

    #[test]
    fn in_flight_docx_should_not_convert() {
        let f = FileRecord::new("n1", "notes.docx").with_step(ConversionStep::Converting);
        assert!(!should_convert(&f));
    }

    #[test]
    fn png_never_converts() {
        let f = FileRecord::new("p1", "photo.png");
        assert!(!should_convert(&f));
    }

    #[test]
    fn only_none_step_is_eligible() {
        for step in ConversionStep::ALL {
            let f = FileRecord::new("x", "slides.PDF").with_step(step);
            assert_eq!(should_convert(&f), step == ConversionStep::None, "{step}");
        }
    }
}
