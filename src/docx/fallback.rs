//! # Fallback Template Synthesizer
//!
//! Builds a minimal, schema-valid DOCX template from scratch: every scalar
//! placeholder the projector provides, plus the participants, signatures,
//! photos, and annexes loops with their image markers. The assembler uses
//! it when the supplied template cannot satisfy the record's actual needs
//! (record has photos but no `{#photos}` loop, signed participants but no
//! `{%signature}` marker). It never replaces a template that is merely
//! missing cosmetic elements.

use crate::archive::Archive;
use crate::docx::{
    CONTENT_TYPES_PART, DOCUMENT_PART, DOCUMENT_RELS_PART, ROOT_RELS_PART, STYLES_PART,
};

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Default Extension="jpeg" ContentType="image/jpeg"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault>
      <w:rPr>
        <w:rFonts w:ascii="Calibri" w:hAnsi="Calibri"/>
        <w:sz w:val="22"/>
      </w:rPr>
    </w:rPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:qFormat/>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="Heading 1"/>
    <w:pPr><w:sz w:val="32"/><w:b/></w:pPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading2">
    <w:name w:val="Heading 2"/>
    <w:pPr><w:sz w:val="28"/><w:b/></w:pPr>
  </w:style>
</w:styles>"#;

/// Main document part. Every projector scalar appears once; the loops carry
/// the inner markers the renderer resolves per iteration.
const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document
  xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
  xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
  xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"
  xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
  xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">
  <w:body>
    <w:p>
      <w:pPr><w:pStyle w:val="Heading1"/></w:pPr>
      <w:r><w:t>{title}</w:t></w:r>
    </w:p>
    <w:p><w:r><w:t>Type: {kind}</w:t></w:r></w:p>
    <w:p>
      <w:pPr><w:pStyle w:val="Heading2"/></w:pPr>
      <w:r><w:t>Inspection data</w:t></w:r>
    </w:p>
    <w:p><w:r><w:t>Address: {address}</w:t></w:r></w:p>
    <w:p><w:r><w:t>Unit: {unit}</w:t></w:r></w:p>
    <w:p><w:r><w:t>Responsible: {responsible}</w:t></w:r></w:p>
    <w:p><w:r><w:t>Survey date: {surveyDate}</w:t></w:r></w:p>
    <w:p><w:r><w:t>Status: {statusText}</w:t></w:r></w:p>
    <w:p><w:r><w:t>Observations: {observations}</w:t></w:r></w:p>
    <w:p>
      <w:pPr><w:pStyle w:val="Heading2"/></w:pPr>
      <w:r><w:t>Participants ({participantCount})</w:t></w:r>
    </w:p>
    <w:p><w:r><w:t>{participantsSummary}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{#participants}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{name} ({role}) - {company} {email}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{/participants}</w:t></w:r></w:p>
    <w:p>
      <w:pPr><w:pStyle w:val="Heading2"/></w:pPr>
      <w:r><w:t>NR-15 assessment ({appliesCount} applicable)</w:t></w:r>
    </w:p>
    <w:p><w:r><w:t>Sectors evaluated: {sectorsEvaluated}</w:t></w:r></w:p>
    <w:p><w:r><w:t>Activities: {activitiesDescription}</w:t></w:r></w:p>
    <w:p><w:r><w:t>Collective protection identified: {epcsIdentified}</w:t></w:r></w:p>
    <w:p><w:r><w:t>NR-15 observations: {nr15Observations}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{#annexes}</w:t></w:r></w:p>
    <w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Annex {annexNumber} - {annexTitle}: {applicability}</w:t></w:r></w:p>
    <w:p><w:r><w:t>Site: {assessmentSite}</w:t></w:r></w:p>
    <w:p><w:r><w:t>Activities: {activitiesDescribed}</w:t></w:r></w:p>
    <w:p><w:r><w:t>PPE in use: {ppeUsed}</w:t></w:r></w:p>
    <w:p><w:r><w:t>Measurements: {measurements}</w:t></w:r></w:p>
    <w:p><w:r><w:t>Exposure time: {exposureTime}</w:t></w:r></w:p>
    <w:p><w:r><w:t>Identified agents: {identifiedAgentCount}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{#agents}</w:t></w:r></w:p>
    <w:p><w:r><w:t>- {agentId}: identified {identified}, {measuredValue} {aboveLimit}, PPE {ppeDescription}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{/agents}</w:t></w:r></w:p>
    <w:p><w:r><w:t>Conclusion: {conclusion}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{/annexes}</w:t></w:r></w:p>
    <w:p>
      <w:pPr><w:pStyle w:val="Heading2"/></w:pPr>
      <w:r><w:t>Photographic record ({photoCount})</w:t></w:r>
    </w:p>
    <w:p><w:r><w:t>{#photos}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{%image}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{caption}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{/photos}</w:t></w:r></w:p>
    <w:p>
      <w:pPr><w:pStyle w:val="Heading2"/></w:pPr>
      <w:r><w:t>Signatures</w:t></w:r>
    </w:p>
    <w:p><w:r><w:t>{#signatures}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{%signature}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{name} ({role}) - {company}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{/signatures}</w:t></w:r></w:p>
    <w:p>
      <w:pPr><w:spacing w:before="240"/></w:pPr>
      <w:r><w:t>Document generated automatically on {generationDate}.</w:t></w:r>
    </w:p>
    <w:p><w:r><w:t>Status: {status}</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

/// Build the minimal container from scratch through the Archive API.
pub fn build_minimal_template() -> Archive {
    let mut archive = Archive::new();
    archive.set_text(CONTENT_TYPES_PART, CONTENT_TYPES_XML);
    archive.ensure_folder("_rels");
    archive.set_text(ROOT_RELS_PART, ROOT_RELS_XML);
    archive.ensure_folder("word");
    archive.set_text(DOCUMENT_PART, DOCUMENT_XML);
    archive.set_text(STYLES_PART, STYLES_XML);
    archive.ensure_folder("word/_rels");
    archive.set_text(DOCUMENT_RELS_PART, DOCUMENT_RELS_XML);
    archive
}
