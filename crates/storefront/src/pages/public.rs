//! Public pages.

use askama::Template;

use crate::routes::paths;
use crate::view::{Link, LinkItem, PageView, View};

use super::{Page, PageContext, PageId};

/// Stand-in for a page whose content lives outside the shell.
#[derive(Debug, Clone, Copy)]
pub struct StubPage {
    id: PageId,
}

impl StubPage {
    #[must_use]
    pub const fn new(id: PageId) -> Self {
        Self { id }
    }
}

impl Page for StubPage {
    fn id(&self) -> PageId {
        self.id
    }

    fn render(&self, _ctx: &PageContext<'_>) -> Result<View, askama::Error> {
        let body = StubTemplate {
            title: self.id.title(),
        }
        .render()?;
        Ok(View::Page(PageView::new(self.id, body)))
    }
}

/// Product detail, addressed by the `:productId` route parameter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductDetailPage;

impl Page for ProductDetailPage {
    fn id(&self) -> PageId {
        PageId::ProductDetail
    }

    fn render(&self, ctx: &PageContext<'_>) -> Result<View, askama::Error> {
        let Some(product_id) = ctx.params.get("productId") else {
            return Ok(View::not_found());
        };
        let body = ProductDetailTemplate {
            product_id,
            back: LinkItem::from(&Link::new(paths::PRODUCTS, "Back to Products")),
        }
        .render()?;
        Ok(View::Page(PageView::new(PageId::ProductDetail, body)))
    }
}

/// The catch-all page.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFoundPage;

impl Page for NotFoundPage {
    fn id(&self) -> PageId {
        PageId::NotFound
    }

    fn render(&self, _ctx: &PageContext<'_>) -> Result<View, askama::Error> {
        Ok(View::not_found())
    }
}

#[derive(Template)]
#[template(path = "pages/stub.html")]
struct StubTemplate {
    title: &'static str,
}

#[derive(Template)]
#[template(path = "pages/product_detail.html")]
struct ProductDetailTemplate<'a> {
    product_id: &'a str,
    back: LinkItem,
}
