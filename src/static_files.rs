//! Static file helpers: MIME lookup, safe path mapping and chunked copy.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Block size used when streaming a file.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Content type used when the extension is unknown.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

static MIME_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("ai", "application/postscript"),
        ("aif", "audio/x-aiff"),
        ("aifc", "audio/x-aiff"),
        ("aiff", "audio/x-aiff"),
        ("asc", "text/plain"),
        ("atom", "application/atom+xml"),
        ("au", "audio/basic"),
        ("avi", "video/x-msvideo"),
        ("bcpio", "application/x-bcpio"),
        ("bin", "application/octet-stream"),
        ("bmp", "image/bmp"),
        ("cdf", "application/x-netcdf"),
        ("cgm", "image/cgm"),
        ("class", "application/octet-stream"),
        ("cpio", "application/x-cpio"),
        ("cpt", "application/mac-compactpro"),
        ("csh", "application/x-csh"),
        ("css", "text/css"),
        ("csv", "text/csv"),
        ("dcr", "application/x-director"),
        ("dir", "application/x-director"),
        ("djv", "image/vnd.djvu"),
        ("djvu", "image/vnd.djvu"),
        ("dll", "application/octet-stream"),
        ("dmg", "application/octet-stream"),
        ("dms", "application/octet-stream"),
        ("doc", "application/msword"),
        ("dtd", "application/xml-dtd"),
        ("dvi", "application/x-dvi"),
        ("dxr", "application/x-director"),
        ("eps", "application/postscript"),
        ("etx", "text/x-setext"),
        ("exe", "application/octet-stream"),
        ("ez", "application/andrew-inset"),
        ("gif", "image/gif"),
        ("gram", "application/srgs"),
        ("grxml", "application/srgs+xml"),
        ("gtar", "application/x-gtar"),
        ("hdf", "application/x-hdf"),
        ("hqx", "application/mac-binhex40"),
        ("htm", "text/html"),
        ("html", "text/html"),
        ("ice", "x-conference/x-cooltalk"),
        ("ico", "image/x-icon"),
        ("ics", "text/calendar"),
        ("ief", "image/ief"),
        ("ifb", "text/calendar"),
        ("iges", "model/iges"),
        ("igs", "model/iges"),
        ("jpe", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("jpg", "image/jpeg"),
        ("js", "application/x-javascript"),
        ("json", "application/json"),
        ("kar", "audio/midi"),
        ("latex", "application/x-latex"),
        ("lha", "application/octet-stream"),
        ("lzh", "application/octet-stream"),
        ("m3u", "audio/x-mpegurl"),
        ("man", "application/x-troff-man"),
        ("mathml", "application/mathml+xml"),
        ("me", "application/x-troff-me"),
        ("mesh", "model/mesh"),
        ("mid", "audio/midi"),
        ("midi", "audio/midi"),
        ("mif", "application/vnd.mif"),
        ("mov", "video/quicktime"),
        ("movie", "video/x-sgi-movie"),
        ("mp2", "audio/mpeg"),
        ("mp3", "audio/mpeg"),
        ("mpe", "video/mpeg"),
        ("mpeg", "video/mpeg"),
        ("mpg", "video/mpeg"),
        ("mpga", "audio/mpeg"),
        ("ms", "application/x-troff-ms"),
        ("msh", "model/mesh"),
        ("mxu", "video/vnd.mpegurl"),
        ("nc", "application/x-netcdf"),
        ("oda", "application/oda"),
        ("ogg", "application/ogg"),
        ("pbm", "image/x-portable-bitmap"),
        ("pdb", "chemical/x-pdb"),
        ("pdf", "application/pdf"),
        ("pgm", "image/x-portable-graymap"),
        ("pgn", "application/x-chess-pgn"),
        ("png", "image/png"),
        ("pnm", "image/x-portable-anymap"),
        ("ppm", "image/x-portable-pixmap"),
        ("ppt", "application/vnd.ms-powerpoint"),
        ("ps", "application/postscript"),
        ("qt", "video/quicktime"),
        ("ra", "audio/x-pn-realaudio"),
        ("ram", "audio/x-pn-realaudio"),
        ("ras", "image/x-cmu-raster"),
        ("rdf", "application/rdf+xml"),
        ("rgb", "image/x-rgb"),
        ("rm", "application/vnd.rn-realmedia"),
        ("roff", "application/x-troff"),
        ("rss", "application/rss+xml"),
        ("rtf", "text/rtf"),
        ("rtx", "text/richtext"),
        ("sgm", "text/sgml"),
        ("sgml", "text/sgml"),
        ("sh", "application/x-sh"),
        ("shar", "application/x-shar"),
        ("silo", "model/mesh"),
        ("sit", "application/x-stuffit"),
        ("skd", "application/x-koan"),
        ("skm", "application/x-koan"),
        ("skp", "application/x-koan"),
        ("skt", "application/x-koan"),
        ("smi", "application/smil"),
        ("smil", "application/smil"),
        ("snd", "audio/basic"),
        ("so", "application/octet-stream"),
        ("spl", "application/x-futuresplash"),
        ("src", "application/x-wais-source"),
        ("svg", "image/svg+xml"),
        ("swf", "application/x-shockwave-flash"),
        ("t", "application/x-troff"),
        ("tar", "application/x-tar"),
        ("tcl", "application/x-tcl"),
        ("tex", "application/x-tex"),
        ("texi", "application/x-texinfo"),
        ("texinfo", "application/x-texinfo"),
        ("tif", "image/tiff"),
        ("tiff", "image/tiff"),
        ("tr", "application/x-troff"),
        ("tsv", "text/tab-separated-values"),
        ("txt", "text/plain"),
        ("ustar", "application/x-ustar"),
        ("vcd", "application/x-cdlink"),
        ("vrml", "model/vrml"),
        ("vxml", "application/voicexml+xml"),
        ("wav", "audio/x-wav"),
        ("wbmp", "image/vnd.wap.wbmp"),
        ("wbxml", "application/vnd.wap.wbxml"),
        ("wml", "text/vnd.wap.wml"),
        ("wmlc", "application/vnd.wap.wmlc"),
        ("wmls", "text/vnd.wap.wmlscript"),
        ("wmlsc", "application/vnd.wap.wmlscriptc"),
        ("wrl", "model/vrml"),
        ("xbm", "image/x-xbitmap"),
        ("xht", "application/xhtml+xml"),
        ("xhtml", "application/xhtml+xml"),
        ("xls", "application/vnd.ms-excel"),
        ("xml", "application/xml"),
        ("xpm", "image/x-xpixmap"),
        ("xsl", "application/xml"),
        ("xslt", "application/xslt+xml"),
        ("xul", "application/vnd.mozilla.xul+xml"),
        ("xwd", "image/x-xwindowdump"),
        ("xyz", "chemical/x-xyz"),
        ("zip", "application/zip"),
    ]
    .into_iter()
    .collect()
});

/// MIME type registered for an extension (case-insensitive).
#[must_use]
pub fn mime_type(ext: &str) -> Option<&'static str> {
    MIME_TYPES.get(ext.to_ascii_lowercase().as_str()).copied()
}

/// Every `(extension, mime)` pair, sorted by extension.
#[must_use]
pub fn mime_types() -> Vec<(&'static str, &'static str)> {
    let mut all: Vec<_> = MIME_TYPES.iter().map(|(k, v)| (*k, *v)).collect();
    all.sort_unstable();
    all
}

/// Text after the last `.` of the file name, if any.
#[must_use]
pub fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

/// Content type for a file, from its extension.
#[must_use]
pub fn mime_content_type(path: &Path) -> &'static str {
    extension(path)
        .and_then(mime_type)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// Whether a file is served as text (its MIME type starts with `text/`).
#[must_use]
pub fn is_text(path: &Path) -> bool {
    mime_content_type(path).starts_with("text/")
}

/// Copy `reader` into `writer` in [`CHUNK_SIZE`] blocks, flushing after each
/// block. Returns the number of bytes delivered.
///
/// # Errors
///
/// Any read, write or flush error.
pub fn copy_chunked<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> io::Result<u64> {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut delivered = 0u64;
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buffer[..read])?;
        writer.flush()?;
        delivered += read as u64;
    }
    Ok(delivered)
}

/// [`copy_chunked`] from a file on disk.
///
/// # Errors
///
/// The file cannot be opened, or the copy fails.
pub fn copy_file_chunked<W: Write>(path: &Path, writer: &mut W) -> io::Result<u64> {
    let mut file = File::open(path)?;
    let delivered = copy_chunked(&mut file, writer)?;
    debug!(path = %path.display(), bytes = delivered, "File streamed");
    Ok(delivered)
}

/// A directory files are served from.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self { base_dir: base.into() }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Map a URL path below the base directory. Parent components, roots and
    /// prefixes are rejected.
    #[must_use]
    pub fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    /// The mapped path when it names an existing regular file.
    #[must_use]
    pub fn resolve(&self, url_path: &str) -> Option<PathBuf> {
        self.map_path(url_path).filter(|p| p.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct CountingWriter {
        data: Vec<u8>,
        flushes: usize,
    }

    impl Write for CountingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_map_path_prevents_traversal() {
        let sf = StaticFiles::new("tests/staticdata");
        assert!(sf.map_path("../Cargo.toml").is_none());
        assert!(sf.map_path("css/../../Cargo.toml").is_none());
        assert_eq!(
            sf.map_path("/css/./site.css"),
            Some(PathBuf::from("tests/staticdata/css/site.css"))
        );
    }

    #[test]
    fn test_mime_lookup() {
        assert_eq!(mime_type("HTML"), Some("text/html"));
        assert_eq!(mime_type("png"), Some("image/png"));
        assert_eq!(mime_type("nope"), None);
        assert_eq!(mime_content_type(Path::new("a/b.tar")), "application/x-tar");
        assert_eq!(mime_content_type(Path::new("README")), DEFAULT_MIME_TYPE);
        assert!(is_text(Path::new("notes.txt")));
        assert!(!is_text(Path::new("logo.png")));
    }

    #[test]
    fn test_copy_chunked_flushes_per_block() {
        let payload = vec![7u8; CHUNK_SIZE * 2 + 10];
        let mut writer = CountingWriter {
            data: Vec::new(),
            flushes: 0,
        };
        let delivered = copy_chunked(&mut Cursor::new(payload.clone()), &mut writer).unwrap();
        assert_eq!(delivered, payload.len() as u64);
        assert_eq!(writer.data, payload);
        assert_eq!(writer.flushes, 3);
    }
}
