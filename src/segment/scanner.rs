//! Boundary scanner for callable units inside PL/SQL containers
//!
//! A single-pass, character-level state machine that locates the start/end
//! offsets of every function, procedure, and type method inside a cleaned
//! container source, without building a parse tree. Scanning a multi-thousand
//! line package this way is orders of magnitude cheaper than a full grammar
//! parse, which is the whole point: the grammar parser then only ever sees
//! small stubs during metadata extraction.
//!
//! Input MUST be comment-free (see [`crate::segment::strip_comments`]). String
//! literals are tracked so keywords inside them are ignored; `''` is an escaped
//! quote, not a terminator.

use crate::error::TransformError;
use crate::segment::segments::{ContainerSegments, UnitKind, UnitSegment};

/// Scanner states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Between units, looking for an introducer keyword sequence.
    ContainerLevel,
    /// Introducer consumed, expecting the unit name.
    AfterIntroducer,
    /// Inside the signature (parameters, RETURN clause) up to `IS`/`AS`.
    InSignature,
    /// Inside the parameter list parentheses.
    InSignatureParen,
    /// Inside the unit implementation, tracking BEGIN/END depth.
    InBody,
}

/// Locates callable unit boundaries in one cleaned container source.
pub struct BoundaryScanner<'a> {
    container: &'a str,
    text: &'a str,
    src: &'a [u8],
    pos: usize,
    state: State,
    paren_depth: usize,
    body_depth: i32,
    /// The terminating END must follow the unit's own BEGIN; a CASE
    /// expression or nested subprogram in the declaration section balances
    /// back to depth 0 without ending the unit.
    seen_begin: bool,
    /// Nested subprograms opened in the declaration section whose first
    /// BEGIN belongs to the block already counted at their introducer.
    pending_begins: usize,

    unit_kind: Option<UnitKind>,
    unit_name: Option<String>,
    unit_start: usize,
    signature_end: usize,
    body_start: usize,
}

impl<'a> BoundaryScanner<'a> {
    /// Scans a cleaned container and returns the ordered unit segments.
    ///
    /// `container` names the container for error reporting only. Fails with
    /// [`TransformError::StructuralScan`] when a unit has no matching
    /// terminator before the container ends — never truncates silently.
    pub fn scan(container: &'a str, source: &'a str) -> Result<ContainerSegments, TransformError> {
        let mut scanner = BoundaryScanner {
            container,
            text: source,
            src: source.as_bytes(),
            pos: 0,
            state: State::ContainerLevel,
            paren_depth: 0,
            body_depth: 0,
            seen_begin: false,
            pending_begins: 0,
            unit_kind: None,
            unit_name: None,
            unit_start: 0,
            signature_end: 0,
            body_start: 0,
        };
        scanner.run()
    }

    fn run(&mut self) -> Result<ContainerSegments, TransformError> {
        let mut segments = ContainerSegments::new();

        while self.pos < self.src.len() {
            match self.state {
                State::ContainerLevel => self.handle_container_level(),
                State::AfterIntroducer => self.handle_after_introducer(),
                State::InSignature => self.handle_in_signature()?,
                State::InSignatureParen => self.handle_in_signature_paren(),
                State::InBody => self.handle_in_body(&mut segments)?,
            }
        }

        if self.state != State::ContainerLevel {
            return Err(self.structural_error(format!(
                "container ended inside unit {} (no terminating END found)",
                self.unit_name.as_deref().unwrap_or("<unnamed>")
            )));
        }

        Ok(segments)
    }

    // ---- state handlers ----

    fn handle_container_level(&mut self) {
        if self.src[self.pos] == b'\'' {
            self.skip_string_literal();
            return;
        }

        if let Some((kind, sequence_end)) = self.match_introducer(self.pos) {
            self.unit_kind = Some(kind);
            self.unit_start = self.pos;
            self.pos = sequence_end;
            self.state = State::AfterIntroducer;
            return;
        }

        self.pos += 1;
    }

    fn handle_after_introducer(&mut self) {
        let b = self.src[self.pos];
        if b.is_ascii_whitespace() {
            self.pos += 1;
            return;
        }
        if is_ident_start(b) {
            let name_start = self.pos;
            while self.pos < self.src.len() && is_ident_char(self.src[self.pos]) {
                self.pos += 1;
            }
            self.unit_name = Some(self.text[name_start..self.pos].to_string());
            self.state = State::InSignature;
            return;
        }
        // Unexpected character (e.g. quoted identifier) - skip it and keep
        // looking for the name
        self.pos += 1;
    }

    fn handle_in_signature(&mut self) -> Result<(), TransformError> {
        let b = self.src[self.pos];

        if b == b'\'' {
            self.skip_string_literal();
            return Ok(());
        }

        if b == b'(' {
            self.paren_depth = 1;
            self.pos += 1;
            self.state = State::InSignatureParen;
            return Ok(());
        }

        if b == b';' {
            // Forward declaration: signature without IS/AS, back to container
            // level without recording a segment
            self.pos += 1;
            self.reset_unit();
            self.state = State::ContainerLevel;
            return Ok(());
        }

        if self.keyword_at(self.pos, "IS") {
            self.enter_body(self.pos, 2);
            return Ok(());
        }

        if self.keyword_at(self.pos, "AS") {
            // Constructors declare `RETURN SELF AS RESULT`; that AS does not
            // start the body
            let after = self.skip_ws_from(self.pos + 2);
            if self.keyword_at(after, "RESULT") {
                self.pos = after + "RESULT".len();
                return Ok(());
            }
            self.enter_body(self.pos, 2);
            return Ok(());
        }

        self.pos += 1;
        Ok(())
    }

    fn handle_in_signature_paren(&mut self) {
        match self.src[self.pos] {
            b'\'' => {
                self.skip_string_literal();
            }
            b'(' => {
                self.paren_depth += 1;
                self.pos += 1;
            }
            b')' => {
                self.paren_depth -= 1;
                self.pos += 1;
                if self.paren_depth == 0 {
                    self.state = State::InSignature;
                }
            }
            _ => self.pos += 1,
        }
    }

    fn handle_in_body(&mut self, segments: &mut ContainerSegments) -> Result<(), TransformError> {
        let b = self.src[self.pos];

        if b == b'\'' {
            self.skip_string_literal();
            return Ok(());
        }

        // A nested subprogram in the declaration section opens a block that
        // its own final END closes; a nested forward declaration (`;` before
        // IS/AS) declares nothing the depth counter needs to track
        if let Some((_, sequence_end)) = self.match_introducer(self.pos) {
            match self.scan_nested_signature(sequence_end) {
                Some(semicolon) => self.pos = semicolon + 1,
                None => {
                    self.body_depth += 1;
                    self.pending_begins += 1;
                    self.pos = sequence_end;
                }
            }
            return Ok(());
        }

        if self.keyword_at(self.pos, "BEGIN") {
            if self.pending_begins > 0 {
                // First BEGIN of a nested subprogram; its block was counted
                // at the introducer
                self.pending_begins -= 1;
            } else {
                if self.body_depth == 0 {
                    self.seen_begin = true;
                }
                self.body_depth += 1;
            }
            self.pos += "BEGIN".len();
            return Ok(());
        }

        // CASE opens a block closed by either a bare END (case expression) or
        // END CASE (case statement); counting it keeps both balanced
        if self.keyword_at(self.pos, "CASE") {
            self.body_depth += 1;
            self.pos += "CASE".len();
            return Ok(());
        }

        if self.keyword_at(self.pos, "END") {
            let after = self.skip_ws_from(self.pos + 3);

            // END IF / END LOOP close blocks we never counted
            if self.keyword_at(after, "IF") {
                self.pos = after + 2;
                return Ok(());
            }
            if self.keyword_at(after, "LOOP") {
                self.pos = after + 4;
                return Ok(());
            }

            let body_end = self.pos;
            if self.keyword_at(after, "CASE") {
                self.body_depth -= 1;
                self.pos = after + 4;
                return Ok(());
            }

            self.body_depth -= 1;
            self.pos += 3;

            if self.body_depth <= 0 && self.seen_begin {
                // Terminating END of the unit: consume `END [name]? ;`
                let semicolon = self.find_semicolon(self.pos).ok_or_else(|| {
                    self.structural_error(format!(
                        "no `;` after terminating END of unit {}",
                        self.unit_name.as_deref().unwrap_or("<unnamed>")
                    ))
                })?;
                let end_offset = semicolon + 1;
                self.record_segment(end_offset, body_end, segments);
                self.pos = end_offset;
                self.state = State::ContainerLevel;
            }
            return Ok(());
        }

        self.pos += 1;
        Ok(())
    }

    // ---- helpers ----

    fn enter_body(&mut self, keyword_pos: usize, keyword_len: usize) {
        self.signature_end = keyword_pos;
        self.pos = self.skip_ws_from(keyword_pos + keyword_len);
        self.body_start = self.pos;
        self.body_depth = 0;
        self.seen_begin = false;
        self.pending_begins = 0;
        self.state = State::InBody;
    }

    fn record_segment(
        &mut self,
        end_offset: usize,
        body_end: usize,
        segments: &mut ContainerSegments,
    ) {
        let signature_text = self.text[self.unit_start..self.signature_end]
            .trim_end()
            .to_string();
        segments.push(UnitSegment {
            name: self.unit_name.take().unwrap_or_default(),
            kind: self.unit_kind.take().unwrap_or(UnitKind::Procedure),
            signature_text,
            start_offset: self.unit_start,
            end_offset,
            signature_end: self.signature_end,
            body_start: self.body_start,
            body_end,
        });
        self.reset_unit();
    }

    fn reset_unit(&mut self) {
        self.unit_kind = None;
        self.unit_name = None;
        self.paren_depth = 0;
        self.body_depth = 0;
        self.seen_begin = false;
        self.pending_begins = 0;
    }

    /// Matches a unit-introducing keyword sequence at `pos` and returns the
    /// kind plus the byte offset one past the final keyword of the sequence.
    fn match_introducer(&self, pos: usize) -> Option<(UnitKind, usize)> {
        if self.keyword_at(pos, "FUNCTION") {
            return Some((UnitKind::Function, pos + 8));
        }
        if self.keyword_at(pos, "PROCEDURE") {
            return Some((UnitKind::Procedure, pos + 9));
        }
        if self.keyword_at(pos, "MEMBER") {
            let next = self.skip_ws_from(pos + 6);
            if self.keyword_at(next, "FUNCTION") {
                return Some((UnitKind::MemberFunction, next + 8));
            }
            if self.keyword_at(next, "PROCEDURE") {
                return Some((UnitKind::MemberProcedure, next + 9));
            }
            return None;
        }
        if self.keyword_at(pos, "STATIC") {
            let next = self.skip_ws_from(pos + 6);
            if self.keyword_at(next, "FUNCTION") {
                return Some((UnitKind::StaticFunction, next + 8));
            }
            if self.keyword_at(next, "PROCEDURE") {
                return Some((UnitKind::StaticProcedure, next + 9));
            }
            return None;
        }
        if self.keyword_at(pos, "MAP") {
            let member = self.skip_ws_from(pos + 3);
            if self.keyword_at(member, "MEMBER") {
                let func = self.skip_ws_from(member + 6);
                if self.keyword_at(func, "FUNCTION") {
                    return Some((UnitKind::MapFunction, func + 8));
                }
            }
            return None;
        }
        if self.keyword_at(pos, "ORDER") {
            let member = self.skip_ws_from(pos + 5);
            if self.keyword_at(member, "MEMBER") {
                let func = self.skip_ws_from(member + 6);
                if self.keyword_at(func, "FUNCTION") {
                    return Some((UnitKind::OrderFunction, func + 8));
                }
            }
            return None;
        }
        if self.keyword_at(pos, "CONSTRUCTOR") {
            let func = self.skip_ws_from(pos + 11);
            if self.keyword_at(func, "FUNCTION") {
                return Some((UnitKind::Constructor, func + 8));
            }
            return None;
        }
        None
    }

    /// Case-insensitive keyword match at `pos` with word boundaries on both
    /// sides (`_`, `$`, `#` and alphanumerics are identifier characters).
    fn keyword_at(&self, pos: usize, keyword: &str) -> bool {
        let kw = keyword.as_bytes();
        if pos + kw.len() > self.src.len() {
            return false;
        }
        if !self.src[pos..pos + kw.len()].eq_ignore_ascii_case(kw) {
            return false;
        }
        if pos > 0 && is_ident_char(self.src[pos - 1]) {
            return false;
        }
        if pos + kw.len() < self.src.len() && is_ident_char(self.src[pos + kw.len()]) {
            return false;
        }
        true
    }

    fn skip_ws_from(&self, mut pos: usize) -> usize {
        while pos < self.src.len() && self.src[pos].is_ascii_whitespace() {
            pos += 1;
        }
        pos
    }

    /// Looks ahead over a nested subprogram's signature. Returns the offset
    /// of the `;` when the signature is a forward declaration (`;` at paren
    /// depth 0 before any `IS`/`AS`), or `None` when a body follows.
    fn scan_nested_signature(&self, mut pos: usize) -> Option<usize> {
        let mut depth = 0usize;
        while pos < self.src.len() {
            match self.src[pos] {
                b'\'' => {
                    pos = self.literal_end(pos);
                    continue;
                }
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                b';' if depth == 0 => return Some(pos),
                _ => {
                    if depth == 0
                        && (self.keyword_at(pos, "IS") || self.keyword_at(pos, "AS"))
                    {
                        return None;
                    }
                }
            }
            pos += 1;
        }
        None
    }

    /// Skips a string literal starting at the current `'`. Handles `''`
    /// escapes. An unterminated literal runs to end of input.
    fn skip_string_literal(&mut self) {
        self.pos = self.literal_end(self.pos);
    }

    /// Offset one past the literal that starts at `pos`.
    fn literal_end(&self, mut pos: usize) -> usize {
        pos += 1; // opening quote
        while pos < self.src.len() {
            if self.src[pos] == b'\'' {
                if pos + 1 < self.src.len() && self.src[pos + 1] == b'\'' {
                    pos += 2;
                    continue;
                }
                return pos + 1;
            }
            pos += 1;
        }
        pos
    }

    fn find_semicolon(&self, from: usize) -> Option<usize> {
        (from..self.src.len()).find(|&i| self.src[i] == b';')
    }

    fn structural_error(&self, message: String) -> TransformError {
        TransformError::StructuralScan {
            container: self.container.to_string(),
            position: self.pos,
            message,
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b == b'#'
}
