/// Synthetic inputs for the benchmarks.

pub fn create_large_feed(item_count: usize) -> String {
    let mut items = String::with_capacity(item_count * 320);

    for i in 0..item_count {
        items.push_str(&format!(
            r#"
        <item>
            <title>Article {i}</title>
            <link>https://bench.example.com/articles/{i}</link>
            <description>Summary for article {i}, with enough words to look like a real teaser.</description>
            <pubDate>{date}</pubDate>
            <guid>https://bench.example.com/articles/{i}</guid>
        </item>"#,
            i = i,
            date = format!("Sat, 16 Mar 2024 {:02}:{:02}:00 GMT", (i / 60) % 24, i % 60),
        ));
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
    <channel>
        <title>Bench Feed</title>
        <link>https://bench.example.com</link>
        <description>Generated feed with {} items</description>{}
    </channel>
</rss>"#,
        item_count, items
    )
}

pub fn create_article_page(paragraphs: usize) -> String {
    let body = "<p>Lorem ipsum dolor sit amet, consectetur adipiscing elit.</p>\n".repeat(paragraphs);

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Bench article</title><script>var tracking = true;</script></head>
<body>
    <header><nav><a href="/">Home</a><a href="/world">World</a></nav></header>
    <div id="main-content" class="layout">
        <article class="story">
            <h1>Bench article</h1>
            {}
        </article>
    </div>
    <footer>Subscribe today</footer>
</body>
</html>"#,
        body
    )
}
