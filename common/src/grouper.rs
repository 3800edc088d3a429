//! キャプチャセットの分割
//!
//! パス順に並んだレコードを、連番が減少（リセット）した位置で区切る。
//! 同じディレクトリに混在する別セッションの撮影を見分けるために使う。

use crate::types::CaptureRecord;
use std::iter::Peekable;

/// 連番を持つ要素
pub trait Sequenced {
    fn sequence_number(&self) -> u64;
}

impl Sequenced for CaptureRecord {
    fn sequence_number(&self) -> u64 {
        CaptureRecord::sequence_number(self)
    }
}

impl<T: Sequenced + ?Sized> Sequenced for &T {
    fn sequence_number(&self) -> u64 {
        (**self).sequence_number()
    }
}

/// 連続区間ごとに `Vec` を返す遅延イテレータ（入力を1回だけ走査する）
pub struct CaptureSets<I: Iterator> {
    inner: Peekable<I>,
}

impl<I> Iterator for CaptureSets<I>
where
    I: Iterator,
    I::Item: Sequenced,
{
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.inner.next()?;
        let mut prev = first.sequence_number();
        let mut set = vec![first];

        // 前の連番より小さくなったら新しいセット
        while let Some(item) = self.inner.next_if(|next| next.sequence_number() >= prev) {
            prev = item.sequence_number();
            set.push(item);
        }

        Some(set)
    }
}

/// パス順に並んだ要素をキャプチャセットに分割
pub fn capture_sets<I>(items: I) -> CaptureSets<I::IntoIter>
where
    I: IntoIterator,
    I::Item: Sequenced,
{
    CaptureSets {
        inner: items.into_iter().peekable(),
    }
}
