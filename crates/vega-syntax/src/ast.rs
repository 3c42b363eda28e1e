//! Arena-allocated Go syntax tree.
//!
//! Every node lives in a single [`SyntaxTree`] arena and is addressed by a
//! [`NodeId`]. Node ranges are byte offsets into the file text; token
//! positions (see [`crate::FileSet`]) are derived from them by adding the
//! file's base.

use std::fmt;

use text_size::{TextRange, TextSize};
use vega_core::Name;

use crate::token::TokenKind;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_raw(raw: u32) -> Self {
        NodeId(raw)
    }

    #[must_use]
    pub fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    File {
        name: NodeId,
        imports: Vec<NodeId>,
        decls: Vec<NodeId>,
    },

    // Declarations.
    GenDecl {
        tok: TokenKind,
        lparen: Option<TextSize>,
        specs: Vec<NodeId>,
        rparen: Option<TextSize>,
    },
    FuncDecl {
        recv: Option<NodeId>,
        name: NodeId,
        ty: NodeId,
        body: Option<NodeId>,
    },
    ImportSpec {
        name: Option<NodeId>,
        path: NodeId,
    },
    ValueSpec {
        names: Vec<NodeId>,
        ty: Option<NodeId>,
        values: Vec<NodeId>,
    },
    TypeSpec {
        name: NodeId,
        type_params: Option<NodeId>,
        assign: bool,
        ty: NodeId,
    },

    // Types.
    Field {
        names: Vec<NodeId>,
        ty: NodeId,
        tag: Option<NodeId>,
    },
    /// Parameter, result, struct-field, interface-method or type-parameter list.
    /// `open`/`close` are absent for a single unparenthesized result type.
    FieldList {
        open: Option<TextSize>,
        fields: Vec<NodeId>,
        close: Option<TextSize>,
    },
    FuncType {
        type_params: Option<NodeId>,
        params: NodeId,
        results: Option<NodeId>,
    },
    ArrayType {
        len: Option<NodeId>,
        elem: NodeId,
    },
    StructType {
        fields: NodeId,
    },
    InterfaceType {
        methods: NodeId,
    },
    MapType {
        key: NodeId,
        value: NodeId,
    },
    ChanType {
        dir: ChanDir,
        value: NodeId,
    },
    Ellipsis {
        elt: Option<NodeId>,
    },

    // Expressions.
    Ident {
        name: Name,
    },
    BasicLit {
        kind: TokenKind,
        value: Name,
    },
    CompositeLit {
        ty: Option<NodeId>,
        lbrace: TextSize,
        elts: Vec<NodeId>,
        rbrace: TextSize,
    },
    FuncLit {
        ty: NodeId,
        body: NodeId,
    },
    Paren {
        x: NodeId,
    },
    Selector {
        x: NodeId,
        sel: NodeId,
    },
    /// `x[i]`, or a generic instantiation `x[T1, T2]`.
    Index {
        x: NodeId,
        lbrack: TextSize,
        indices: Vec<NodeId>,
        rbrack: TextSize,
    },
    Slice {
        x: NodeId,
        low: Option<NodeId>,
        high: Option<NodeId>,
        max: Option<NodeId>,
        slice3: bool,
    },
    /// `x.(T)`; `ty` is `None` for the `x.(type)` of a type switch.
    TypeAssert {
        x: NodeId,
        ty: Option<NodeId>,
    },
    Call {
        fun: NodeId,
        lparen: TextSize,
        args: Vec<NodeId>,
        ellipsis: Option<TextSize>,
        rparen: TextSize,
    },
    Star {
        x: NodeId,
    },
    Unary {
        op: TokenKind,
        x: NodeId,
    },
    Binary {
        op: TokenKind,
        op_pos: TextSize,
        x: NodeId,
        y: NodeId,
    },
    KeyValue {
        key: NodeId,
        value: NodeId,
    },
    Bad,

    // Statements.
    DeclStmt {
        decl: NodeId,
    },
    EmptyStmt,
    Labeled {
        label: NodeId,
        stmt: NodeId,
    },
    ExprStmt {
        x: NodeId,
    },
    Send {
        chan: NodeId,
        value: NodeId,
    },
    IncDec {
        x: NodeId,
        tok: TokenKind,
    },
    Assign {
        lhs: Vec<NodeId>,
        tok: TokenKind,
        tok_pos: TextSize,
        rhs: Vec<NodeId>,
    },
    Go {
        call: NodeId,
    },
    Defer {
        call: NodeId,
    },
    Return {
        results: Vec<NodeId>,
    },
    Branch {
        tok: TokenKind,
        label: Option<NodeId>,
    },
    Block {
        lbrace: TextSize,
        stmts: Vec<NodeId>,
        rbrace: TextSize,
    },
    If {
        init: Option<NodeId>,
        cond: NodeId,
        body: NodeId,
        else_: Option<NodeId>,
    },
    /// `case a, b:` or `default:` (empty `list`, `is_default`).
    CaseClause {
        list: Vec<NodeId>,
        is_default: bool,
        colon: TextSize,
        body: Vec<NodeId>,
    },
    Switch {
        init: Option<NodeId>,
        tag: Option<NodeId>,
        body: NodeId,
    },
    /// `assign` is either `x := y.(type)` (an `Assign`) or `y.(type)` (an `ExprStmt`).
    TypeSwitch {
        init: Option<NodeId>,
        assign: NodeId,
        body: NodeId,
    },
    CommClause {
        comm: Option<NodeId>,
        colon: TextSize,
        body: Vec<NodeId>,
    },
    Select {
        body: NodeId,
    },
    For {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        post: Option<NodeId>,
        body: NodeId,
    },
    Range {
        key: Option<NodeId>,
        value: Option<NodeId>,
        tok: Option<TokenKind>,
        x: NodeId,
        body: NodeId,
    },
}

impl NodeKind {
    pub fn is_expr(&self) -> bool {
        matches!(
            self,
            NodeKind::Ident { .. }
                | NodeKind::BasicLit { .. }
                | NodeKind::CompositeLit { .. }
                | NodeKind::FuncLit { .. }
                | NodeKind::Paren { .. }
                | NodeKind::Selector { .. }
                | NodeKind::Index { .. }
                | NodeKind::Slice { .. }
                | NodeKind::TypeAssert { .. }
                | NodeKind::Call { .. }
                | NodeKind::Star { .. }
                | NodeKind::Unary { .. }
                | NodeKind::Binary { .. }
                | NodeKind::KeyValue { .. }
                | NodeKind::ArrayType { .. }
                | NodeKind::StructType { .. }
                | NodeKind::FuncType { .. }
                | NodeKind::InterfaceType { .. }
                | NodeKind::MapType { .. }
                | NodeKind::ChanType { .. }
                | NodeKind::Ellipsis { .. }
                | NodeKind::Bad
        )
    }

    pub fn is_stmt(&self) -> bool {
        matches!(
            self,
            NodeKind::DeclStmt { .. }
                | NodeKind::EmptyStmt
                | NodeKind::Labeled { .. }
                | NodeKind::ExprStmt { .. }
                | NodeKind::Send { .. }
                | NodeKind::IncDec { .. }
                | NodeKind::Assign { .. }
                | NodeKind::Go { .. }
                | NodeKind::Defer { .. }
                | NodeKind::Return { .. }
                | NodeKind::Branch { .. }
                | NodeKind::Block { .. }
                | NodeKind::If { .. }
                | NodeKind::CaseClause { .. }
                | NodeKind::Switch { .. }
                | NodeKind::TypeSwitch { .. }
                | NodeKind::CommClause { .. }
                | NodeKind::Select { .. }
                | NodeKind::For { .. }
                | NodeKind::Range { .. }
        )
    }

    pub fn is_decl(&self) -> bool {
        matches!(self, NodeKind::GenDecl { .. } | NodeKind::FuncDecl { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub range: TextRange,
}

/// A run of comments with no blank line between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
    pub comments: Vec<TextRange>,
}

impl CommentGroup {
    pub fn range(&self) -> TextRange {
        let start = self.comments.first().map_or(TextSize::from(0), |c| c.start());
        let end = self.comments.last().map_or(start, |c| c.end());
        TextRange::new(start, end)
    }

    /// The comment text with `//`, `/*` and `*/` markers removed, one line per comment.
    pub fn text(&self, src: &str) -> String {
        let mut out = String::new();
        for range in &self.comments {
            let raw = &src[*range];
            let body = if let Some(rest) = raw.strip_prefix("//") {
                rest.strip_prefix(' ').unwrap_or(rest)
            } else {
                raw.trim_start_matches("/*").trim_end_matches("*/").trim()
            };
            out.push_str(body);
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
    root: NodeId,
    comments: Vec<CommentGroup>,
}

impl SyntaxTree {
    pub(crate) fn new(nodes: Vec<Node>, root: NodeId, comments: Vec<CommentGroup>) -> Self {
        let mut tree = SyntaxTree {
            parents: vec![None; nodes.len()],
            nodes,
            root,
            comments,
        };
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            for child in tree.children(id) {
                tree.parents[child.idx()] = Some(id);
                stack.push(child);
            }
        }
        tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.idx()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.idx()].kind
    }

    pub fn range(&self, id: NodeId) -> TextRange {
        self.nodes[id.idx()].range
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.idx()]
    }

    /// Ancestors of `id`, innermost first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    pub fn comments(&self) -> &[CommentGroup] {
        &self.comments
    }

    /// All node ids, in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len() as u32).map(NodeId::from_raw)
    }

    pub fn ident_name(&self, id: NodeId) -> Option<&Name> {
        match self.kind(id) {
            NodeKind::Ident { name } => Some(name),
            _ => None,
        }
    }

    /// The package clause name.
    pub fn package_name(&self) -> Option<&Name> {
        match self.kind(self.root) {
            NodeKind::File { name, .. } => self.ident_name(*name),
            _ => None,
        }
    }

    pub fn decls(&self) -> &[NodeId] {
        match self.kind(self.root) {
            NodeKind::File { decls, .. } => decls,
            _ => &[],
        }
    }

    /// Import specs of the file, in source order.
    pub fn imports(&self) -> &[NodeId] {
        match self.kind(self.root) {
            NodeKind::File { imports, .. } => imports,
            _ => &[],
        }
    }

    /// Import path of an `ImportSpec`, unquoted.
    pub fn import_path(&self, spec: NodeId) -> Option<String> {
        let NodeKind::ImportSpec { path, .. } = self.kind(spec) else {
            return None;
        };
        match self.kind(*path) {
            NodeKind::BasicLit { value, .. } => crate::literals::unquote(value).ok(),
            _ => None,
        }
    }

    /// Strips any number of enclosing parentheses.
    pub fn unparen(&self, mut id: NodeId) -> NodeId {
        while let NodeKind::Paren { x } = self.kind(id) {
            id = *x;
        }
        id
    }

    /// The comment group that documents `decl`: the group that ends on the line
    /// directly above it.
    pub fn doc_comment(&self, src: &str, decl: NodeId) -> Option<&CommentGroup> {
        let start = self.range(decl).start();
        let group = self
            .comments
            .iter()
            .take_while(|g| g.range().end() <= start)
            .last()?;
        let between = &src[usize::from(group.range().end())..usize::from(start)];
        (between.chars().filter(|&c| c == '\n').count() == 1 && between.trim().is_empty())
            .then_some(group)
    }

    /// Pre-order walk. `visit` returns `false` to skip the children of a node.
    pub fn walk(&self, id: NodeId, visit: &mut impl FnMut(NodeId) -> bool) {
        if !visit(id) {
            return;
        }
        for child in self.children(id) {
            self.walk(child, visit);
        }
    }

    /// Direct children of `id`, in source order.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        fn push_opt(out: &mut Vec<NodeId>, id: &Option<NodeId>) {
            if let Some(id) = id {
                out.push(*id);
            }
        }

        let mut out = Vec::new();
        match self.kind(id) {
            NodeKind::File {
                name,
                imports: _,
                decls,
            } => {
                out.push(*name);
                out.extend(decls);
            }
            NodeKind::GenDecl { specs, .. } => out.extend(specs),
            NodeKind::FuncDecl {
                recv,
                name,
                ty,
                body,
            } => {
                push_opt(&mut out, recv);
                out.push(*name);
                out.push(*ty);
                push_opt(&mut out, body);
            }
            NodeKind::ImportSpec { name, path } => {
                push_opt(&mut out, name);
                out.push(*path);
            }
            NodeKind::ValueSpec { names, ty, values } => {
                out.extend(names);
                push_opt(&mut out, ty);
                out.extend(values);
            }
            NodeKind::TypeSpec {
                name,
                type_params,
                ty,
                ..
            } => {
                out.push(*name);
                push_opt(&mut out, type_params);
                out.push(*ty);
            }
            NodeKind::Field { names, ty, tag } => {
                out.extend(names);
                out.push(*ty);
                push_opt(&mut out, tag);
            }
            NodeKind::FieldList { fields, .. } => out.extend(fields),
            NodeKind::FuncType {
                type_params,
                params,
                results,
            } => {
                push_opt(&mut out, type_params);
                out.push(*params);
                push_opt(&mut out, results);
            }
            NodeKind::ArrayType { len, elem } => {
                push_opt(&mut out, len);
                out.push(*elem);
            }
            NodeKind::StructType { fields } => out.push(*fields),
            NodeKind::InterfaceType { methods } => out.push(*methods),
            NodeKind::MapType { key, value } => out.extend([*key, *value]),
            NodeKind::ChanType { value, .. } => out.push(*value),
            NodeKind::Ellipsis { elt } => push_opt(&mut out, elt),
            NodeKind::Ident { .. } | NodeKind::BasicLit { .. } | NodeKind::Bad => {}
            NodeKind::CompositeLit { ty, elts, .. } => {
                push_opt(&mut out, ty);
                out.extend(elts);
            }
            NodeKind::FuncLit { ty, body } => out.extend([*ty, *body]),
            NodeKind::Paren { x } | NodeKind::Star { x } | NodeKind::Unary { x, .. } => {
                out.push(*x)
            }
            NodeKind::Selector { x, sel } => out.extend([*x, *sel]),
            NodeKind::Index { x, indices, .. } => {
                out.push(*x);
                out.extend(indices);
            }
            NodeKind::Slice {
                x, low, high, max, ..
            } => {
                out.push(*x);
                push_opt(&mut out, low);
                push_opt(&mut out, high);
                push_opt(&mut out, max);
            }
            NodeKind::TypeAssert { x, ty } => {
                out.push(*x);
                push_opt(&mut out, ty);
            }
            NodeKind::Call { fun, args, .. } => {
                out.push(*fun);
                out.extend(args);
            }
            NodeKind::Binary { x, y, .. } => out.extend([*x, *y]),
            NodeKind::KeyValue { key, value } => out.extend([*key, *value]),
            NodeKind::DeclStmt { decl } => out.push(*decl),
            NodeKind::EmptyStmt => {}
            NodeKind::Labeled { label, stmt } => out.extend([*label, *stmt]),
            NodeKind::ExprStmt { x } => out.push(*x),
            NodeKind::Send { chan, value } => out.extend([*chan, *value]),
            NodeKind::IncDec { x, .. } => out.push(*x),
            NodeKind::Assign { lhs, rhs, .. } => {
                out.extend(lhs);
                out.extend(rhs);
            }
            NodeKind::Go { call } | NodeKind::Defer { call } => out.push(*call),
            NodeKind::Return { results } => out.extend(results),
            NodeKind::Branch { label, .. } => push_opt(&mut out, label),
            NodeKind::Block { stmts, .. } => out.extend(stmts),
            NodeKind::If {
                init,
                cond,
                body,
                else_,
            } => {
                push_opt(&mut out, init);
                out.extend([*cond, *body]);
                push_opt(&mut out, else_);
            }
            NodeKind::CaseClause { list, body, .. } => {
                out.extend(list);
                out.extend(body);
            }
            NodeKind::Switch { init, tag, body } => {
                push_opt(&mut out, init);
                push_opt(&mut out, tag);
                out.push(*body);
            }
            NodeKind::TypeSwitch { init, assign, body } => {
                push_opt(&mut out, init);
                out.extend([*assign, *body]);
            }
            NodeKind::CommClause { comm, body, .. } => {
                push_opt(&mut out, comm);
                out.extend(body);
            }
            NodeKind::Select { body } => out.push(*body),
            NodeKind::For {
                init,
                cond,
                post,
                body,
            } => {
                push_opt(&mut out, init);
                push_opt(&mut out, cond);
                push_opt(&mut out, post);
                out.push(*body);
            }
            NodeKind::Range {
                key,
                value,
                x,
                body,
                ..
            } => {
                push_opt(&mut out, key);
                push_opt(&mut out, value);
                out.extend([*x, *body]);
            }
        }
        out
    }
}
