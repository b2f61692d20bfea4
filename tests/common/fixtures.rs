/// A catalog mixing namespaces, attributes, comments, PIs and mixed content.
pub const CATALOG: &str = r#"<?xml version="1.0"?>
<catalog xmlns="urn:books" xmlns:m="urn:meta" xml:lang="en">
  <book id="b1" m:rating="5">
    <title>Rust in Action</title>
    <price>39.5</price>
  </book>
  <!-- discontinued -->
  <book id="b2">
    <title>Programming <em>XPath</em> quickly</title>
    <price>12</price>
    <?render hidden?>
  </book>
  <m:note xmlns="">plain <b>bold</b> tail</m:note>
  <section>
    <book id="b3" xml:lang="de">
      <title>Baumstrukturen</title>
      <price>n/a</price>
    </book>
  </section>
</catalog>"#;

/// Non-namespaced records used for numeric and positional checks.
pub const RECORDS: &str = r#"<records>
  <record n="1"><value>10</value></record>
  <record n="2"><value>20</value></record>
  <record n="3"><value>30</value></record>
  <record n="4"><value>forty</value></record>
</records>"#;

pub const SIMPLE_TEXT: &str = "<root><a>TEXT</a></root>";

pub const BOOKS_NS: &str = "urn:books";
pub const META_NS: &str = "urn:meta";
