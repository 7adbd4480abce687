use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use bzip2::read::MultiBzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::{debug, info};

/// One article as stored in the dump: title, namespace and latest revision text.
#[derive(Debug, Clone)]
pub struct Page {
    pub title: String,
    pub ns: Option<i32>,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum DumpError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed XML near byte {position}: {source}")]
    Xml {
        position: u64,
        source: quick_xml::Error,
    },
    #[error("dump ended inside page {title:?}")]
    Truncated { title: Option<String> },
}

/// Open a dump file; `.bz2` files are decompressed on the fly.
pub fn open_dump(path: &Path) -> Result<DumpReader<Box<dyn BufRead>>, DumpError> {
    let file = File::open(path)?;
    let compressed = path.extension().is_some_and(|ext| ext == "bz2");
    info!(path = %path.display(), compressed, "opening dump");
    let inner: Box<dyn BufRead> = if compressed {
        Box::new(BufReader::new(MultiBzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(DumpReader::new(inner))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Capture {
    None,
    Title,
    Ns,
    Text,
}

/// Streams pages out of a MediaWiki XML export, one `<page>` at a time.
pub struct DumpReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> DumpReader<R> {
    pub fn new(inner: R) -> Self {
        DumpReader {
            reader: Reader::from_reader(inner),
            buf: Vec::new(),
            done: false,
        }
    }

    fn next_page(&mut self) -> Result<Option<Page>, DumpError> {
        let mut in_page = false;
        let mut in_revision = false;
        let mut capture = Capture::None;
        let mut title: Option<String> = None;
        let mut ns = String::new();
        let mut text: Option<String> = None;

        loop {
            self.buf.clear();
            let position = self.reader.buffer_position() as u64;
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(|source| DumpError::Xml { position, source })?;

            match event {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"page" => {
                        in_page = true;
                        in_revision = false;
                        title = None;
                        ns.clear();
                        text = None;
                    }
                    b"revision" if in_page => in_revision = true,
                    b"title" if in_page && !in_revision => {
                        capture = Capture::Title;
                        title = Some(String::new());
                    }
                    b"ns" if in_page && !in_revision => capture = Capture::Ns,
                    // Later revisions replace earlier ones.
                    b"text" if in_revision => {
                        capture = Capture::Text;
                        text = Some(String::new());
                    }
                    _ => {}
                },
                Event::Text(e) if capture != Capture::None => {
                    let chunk = e.unescape().map_err(|err| DumpError::Xml {
                        position,
                        source: err.into(),
                    })?;
                    push_capture(capture, &chunk, &mut title, &mut ns, &mut text);
                }
                Event::CData(e) if capture != Capture::None => {
                    let chunk = String::from_utf8_lossy(&e);
                    push_capture(capture, &chunk, &mut title, &mut ns, &mut text);
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"title" | b"ns" | b"text" => capture = Capture::None,
                    b"revision" => in_revision = false,
                    b"page" if in_page => {
                        in_page = false;
                        match (title.take(), text.take()) {
                            (Some(title), Some(text)) if !text.trim().is_empty() => {
                                return Ok(Some(Page {
                                    title,
                                    ns: ns.trim().parse().ok(),
                                    text,
                                }));
                            }
                            (title, _) => debug!(?title, "skipping page without text"),
                        }
                    }
                    _ => {}
                },
                Event::Eof => {
                    if in_page {
                        return Err(DumpError::Truncated { title });
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

fn push_capture(
    capture: Capture,
    chunk: &str,
    title: &mut Option<String>,
    ns: &mut String,
    text: &mut Option<String>,
) {
    match capture {
        Capture::Title => title.get_or_insert_with(String::new).push_str(chunk),
        Capture::Ns => ns.push_str(chunk),
        Capture::Text => text.get_or_insert_with(String::new).push_str(chunk),
        Capture::None => {}
    }
}

impl<R: BufRead> Iterator for DumpReader<R> {
    type Item = Result<Page, DumpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_page() {
            Ok(Some(page)) => Some(Ok(page)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
