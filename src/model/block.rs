use super::blocks::*;
use super::common::BlockCommon;
use crate::types::{Color, RichTextSpan};
use serde::{Deserialize, Serialize};

/// Macro to reduce boilerplate in Block enum methods
macro_rules! match_all_blocks {
    ($self:expr, $pattern:pat => $result:expr) => {
        match $self {
            Block::Paragraph($pattern) => $result,
            Block::Heading1($pattern) => $result,
            Block::Heading2($pattern) => $result,
            Block::Heading3($pattern) => $result,
            Block::BulletedListItem($pattern) => $result,
            Block::NumberedListItem($pattern) => $result,
            Block::ToDo($pattern) => $result,
            Block::Quote($pattern) => $result,
            Block::Callout($pattern) => $result,
            Block::Code($pattern) => $result,
            Block::Divider($pattern) => $result,
            Block::Image($pattern) => $result,
            Block::Table($pattern) => $result,
            Block::TableRow($pattern) => $result,
        }
    };
}

/// The Notion block types this converter produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    Paragraph(ParagraphBlock),
    Heading1(Heading1Block),
    Heading2(Heading2Block),
    Heading3(Heading3Block),
    BulletedListItem(BulletedListItemBlock),
    NumberedListItem(NumberedListItemBlock),
    ToDo(ToDoBlock),
    Quote(QuoteBlock),
    Callout(CalloutBlock),
    Code(CodeBlock),
    Divider(DividerBlock),
    Image(ImageBlock),
    Table(TableBlock),
    TableRow(TableRowBlock),
}

impl Block {
    pub fn paragraph(rich_text: Vec<RichTextSpan>) -> Self {
        Block::Paragraph(ParagraphBlock {
            common: BlockCommon::new(),
            content: TextBlockContent::new(rich_text),
        })
    }

    /// Builds a heading; levels outside 1..=3 clamp into that range.
    pub fn heading(level: u8, rich_text: Vec<RichTextSpan>) -> Self {
        let common = BlockCommon::new();
        let content = TextBlockContent::new(rich_text);
        match level {
            0 | 1 => Block::Heading1(Heading1Block { common, content }),
            2 => Block::Heading2(Heading2Block { common, content }),
            _ => Block::Heading3(Heading3Block { common, content }),
        }
    }

    pub fn bulleted(rich_text: Vec<RichTextSpan>) -> Self {
        Block::BulletedListItem(BulletedListItemBlock {
            common: BlockCommon::new(),
            content: TextBlockContent::new(rich_text),
        })
    }

    pub fn numbered(rich_text: Vec<RichTextSpan>) -> Self {
        Block::NumberedListItem(NumberedListItemBlock {
            common: BlockCommon::new(),
            content: TextBlockContent::new(rich_text),
        })
    }

    pub fn to_do(rich_text: Vec<RichTextSpan>, checked: bool) -> Self {
        Block::ToDo(ToDoBlock {
            common: BlockCommon::new(),
            content: TextBlockContent::new(rich_text),
            checked,
        })
    }

    pub fn quote(rich_text: Vec<RichTextSpan>) -> Self {
        Block::Quote(QuoteBlock {
            common: BlockCommon::new(),
            content: TextBlockContent::new(rich_text),
        })
    }

    pub fn callout(rich_text: Vec<RichTextSpan>, icon: Option<Icon>, color: Color) -> Self {
        Block::Callout(CalloutBlock {
            common: BlockCommon::new(),
            icon,
            content: TextBlockContent {
                rich_text,
                color,
            },
        })
    }

    pub fn code(rich_text: Vec<RichTextSpan>, language: impl Into<String>) -> Self {
        Block::Code(CodeBlock {
            common: BlockCommon::new(),
            language: language.into(),
            caption: Vec::new(),
            content: TextBlockContent::new(rich_text),
        })
    }

    pub fn divider() -> Self {
        Block::Divider(DividerBlock::default())
    }

    pub fn image(image: MediaSource, caption: Vec<RichTextSpan>) -> Self {
        Block::Image(ImageBlock {
            common: BlockCommon::new(),
            image,
            caption,
        })
    }

    pub fn table(table_width: usize, has_column_header: bool, rows: Vec<Block>) -> Self {
        Block::Table(TableBlock {
            common: BlockCommon::with_children(rows),
            table_width,
            has_column_header,
            has_row_header: false,
        })
    }

    pub fn table_row(cells: Vec<Vec<RichTextSpan>>) -> Self {
        Block::TableRow(TableRowBlock {
            common: BlockCommon::new(),
            cells,
        })
    }

    /// Get the block's children
    pub fn children(&self) -> &Vec<Block> {
        match_all_blocks!(self, b => &b.common.children)
    }

    /// Get mutable reference to children
    pub fn children_mut(&mut self) -> &mut Vec<Block> {
        match_all_blocks!(self, b => &mut b.common.children)
    }

    /// Set children
    pub fn set_children(&mut self, children: Vec<Block>) {
        *self.children_mut() = children;
    }

    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    /// The rich text a block displays, for block types that carry any.
    pub fn rich_text(&self) -> Option<&[RichTextSpan]> {
        match self {
            Block::Paragraph(b) => Some(&b.content.rich_text),
            Block::Heading1(b) => Some(&b.content.rich_text),
            Block::Heading2(b) => Some(&b.content.rich_text),
            Block::Heading3(b) => Some(&b.content.rich_text),
            Block::BulletedListItem(b) => Some(&b.content.rich_text),
            Block::NumberedListItem(b) => Some(&b.content.rich_text),
            Block::ToDo(b) => Some(&b.content.rich_text),
            Block::Quote(b) => Some(&b.content.rich_text),
            Block::Callout(b) => Some(&b.content.rich_text),
            Block::Code(b) => Some(&b.content.rich_text),
            Block::Image(b) => Some(&b.caption),
            Block::Divider(_) | Block::Table(_) | Block::TableRow(_) => None,
        }
    }

    /// Mutable access to the rich text of text-bearing blocks.
    pub fn rich_text_mut(&mut self) -> Option<&mut Vec<RichTextSpan>> {
        match self {
            Block::Paragraph(b) => Some(&mut b.content.rich_text),
            Block::Heading1(b) => Some(&mut b.content.rich_text),
            Block::Heading2(b) => Some(&mut b.content.rich_text),
            Block::Heading3(b) => Some(&mut b.content.rich_text),
            Block::BulletedListItem(b) => Some(&mut b.content.rich_text),
            Block::NumberedListItem(b) => Some(&mut b.content.rich_text),
            Block::ToDo(b) => Some(&mut b.content.rich_text),
            Block::Quote(b) => Some(&mut b.content.rich_text),
            Block::Callout(b) => Some(&mut b.content.rich_text),
            Block::Code(b) => Some(&mut b.content.rich_text),
            Block::Image(b) => Some(&mut b.caption),
            Block::Divider(_) | Block::Table(_) | Block::TableRow(_) => None,
        }
    }

    /// Whether Notion lets this block type own child blocks.
    pub fn accepts_children(&self) -> bool {
        matches!(
            self,
            Block::Paragraph(_)
                | Block::BulletedListItem(_)
                | Block::NumberedListItem(_)
                | Block::ToDo(_)
                | Block::Quote(_)
                | Block::Callout(_)
                | Block::Table(_)
        )
    }

    pub fn is_list_item(&self) -> bool {
        matches!(
            self,
            Block::BulletedListItem(_) | Block::NumberedListItem(_) | Block::ToDo(_)
        )
    }

    /// Get block type name
    pub fn block_type(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::Heading1(_) => "heading_1",
            Block::Heading2(_) => "heading_2",
            Block::Heading3(_) => "heading_3",
            Block::BulletedListItem(_) => "bulleted_list_item",
            Block::NumberedListItem(_) => "numbered_list_item",
            Block::ToDo(_) => "to_do",
            Block::Quote(_) => "quote",
            Block::Callout(_) => "callout",
            Block::Code(_) => "code",
            Block::Divider(_) => "divider",
            Block::Image(_) => "image",
            Block::Table(_) => "table",
            Block::TableRow(_) => "table_row",
        }
    }

    /// Accept a visitor
    pub fn accept<V: BlockVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Block::Paragraph(b) => visitor.visit_paragraph(&b.content),
            Block::Heading1(b) => visitor.visit_heading(1, &b.content),
            Block::Heading2(b) => visitor.visit_heading(2, &b.content),
            Block::Heading3(b) => visitor.visit_heading(3, &b.content),
            Block::BulletedListItem(b) => visitor.visit_bulleted_list_item(&b.content),
            Block::NumberedListItem(b) => visitor.visit_numbered_list_item(&b.content),
            Block::ToDo(b) => visitor.visit_todo(b),
            Block::Quote(b) => visitor.visit_quote(&b.content),
            Block::Callout(b) => visitor.visit_callout(b),
            Block::Code(b) => visitor.visit_code(b),
            Block::Divider(_) => visitor.visit_divider(),
            Block::Image(b) => visitor.visit_image(b),
            Block::Table(b) => visitor.visit_table(b),
            Block::TableRow(b) => visitor.visit_table_row(&b.cells),
        }
    }
}

/// Visitor trait for traversing block structures.
///
/// All methods have default implementations that return `Default::default()`,
/// so implementors only need to override the methods they care about.
pub trait BlockVisitor {
    type Output: Default;

    fn visit_paragraph(&mut self, _content: &TextBlockContent) -> Self::Output {
        Default::default()
    }
    fn visit_heading(&mut self, _level: u8, _content: &TextBlockContent) -> Self::Output {
        Default::default()
    }
    fn visit_bulleted_list_item(&mut self, _content: &TextBlockContent) -> Self::Output {
        Default::default()
    }
    fn visit_numbered_list_item(&mut self, _content: &TextBlockContent) -> Self::Output {
        Default::default()
    }
    fn visit_todo(&mut self, _todo: &ToDoBlock) -> Self::Output {
        Default::default()
    }
    fn visit_quote(&mut self, _content: &TextBlockContent) -> Self::Output {
        Default::default()
    }
    fn visit_callout(&mut self, _callout: &CalloutBlock) -> Self::Output {
        Default::default()
    }
    fn visit_code(&mut self, _code: &CodeBlock) -> Self::Output {
        Default::default()
    }
    fn visit_divider(&mut self) -> Self::Output {
        Default::default()
    }
    fn visit_image(&mut self, _image: &ImageBlock) -> Self::Output {
        Default::default()
    }
    fn visit_table(&mut self, _table: &TableBlock) -> Self::Output {
        Default::default()
    }
    fn visit_table_row(&mut self, _cells: &[Vec<RichTextSpan>]) -> Self::Output {
        Default::default()
    }
}

/// Visits every block in `blocks` depth-first, parents before children.
pub fn walk_blocks<V: BlockVisitor>(blocks: &[Block], visitor: &mut V) {
    for block in blocks {
        block.accept(visitor);
        walk_blocks(block.children(), visitor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_levels_clamp() {
        assert_eq!(Block::heading(0, vec![]).block_type(), "heading_1");
        assert_eq!(Block::heading(2, vec![]).block_type(), "heading_2");
        assert_eq!(Block::heading(6, vec![]).block_type(), "heading_3");
    }

    #[test]
    fn children_accessors() {
        let mut parent = Block::bulleted(vec![RichTextSpan::plain("parent")]);
        assert!(!parent.has_children());
        parent.children_mut().push(Block::divider());
        assert_eq!(parent.children().len(), 1);
        parent.set_children(vec![]);
        assert!(!parent.has_children());
    }

    #[test]
    fn walk_visits_nested_blocks() {
        struct Counter(usize);
        impl BlockVisitor for Counter {
            type Output = ();
            fn visit_table_row(&mut self, _cells: &[Vec<RichTextSpan>]) {
                self.0 += 1;
            }
        }

        let table = Block::table(
            1,
            true,
            vec![
                Block::table_row(vec![vec![RichTextSpan::plain("a")]]),
                Block::table_row(vec![vec![RichTextSpan::plain("b")]]),
            ],
        );
        let mut counter = Counter(0);
        walk_blocks(&[table], &mut counter);
        assert_eq!(counter.0, 2);
    }
}
