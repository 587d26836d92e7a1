use bookmark_scout::bookmarks::parse_bookmark_html;
use bookmark_scout::fetcher::extract_visible_text;
use criterion::{Criterion, criterion_group, criterion_main};
use itertools::Itertools;
use std::hint::black_box;

const EXPORT_HEADER: &str = concat!(
    "<!DOCTYPE NETSCAPE-Bookmark-file-1>\n",
    "<TITLE>Bookmarks</TITLE>\n",
    "<H1>Bookmarks</H1>\n",
    "<DL><p>\n"
);

fn synthetic_folder(folder: usize, per_folder: usize) -> String {
    let links = (0..per_folder)
        .map(|item| {
            format!(
                "<DT><A HREF=\"{}\" ADD_DATE=\"1700000000\">Bookmark {folder}-{item}</A>",
                format_args!("https://example.com/{folder}/{item}")
            )
        })
        .join("\n");
    format!("<DT><H3>Folder {folder}</H3>\n<DL><p>\n{links}\n</DL><p>")
}

fn synthetic_export(folders: usize, per_folder: usize) -> String {
    let body = (0..folders)
        .map(|folder| synthetic_folder(folder, per_folder))
        .join("\n");
    format!("{EXPORT_HEADER}{body}\n</DL><p>\n")
}

fn synthetic_page(paragraphs: usize) -> String {
    let body = (0..paragraphs)
        .map(|paragraph| {
            format!(
                "<p>Paragraph {paragraph} with <a href=\"/x\">a link</a> and some text.</p>{}",
                format_args!("<script>f({paragraph})</script>")
            )
        })
        .join("");
    format!("<html><head><style>p {{ color: red; }}</style></head><body>{body}</body></html>")
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let export = synthetic_export(50, 100);
    c.bench_function("parse_bookmark_html", |b| {
        b.iter(|| parse_bookmark_html(black_box(&export)))
    });

    let page = synthetic_page(500);
    c.bench_function("extract_visible_text", |b| {
        b.iter(|| extract_visible_text(black_box(&page)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
